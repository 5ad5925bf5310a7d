use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// signs the proxy links that get written into rewritten playlists so that the proxy can tell
/// its own links apart from someone pointing it at random urls
pub struct SignatureUtil {
    secret: String,
}

impl SignatureUtil {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// sig is over: client_id + expiry + url
    /// client_id is a hash of IP + User-Agent
    pub fn generate_signature(&self, client_id: &str, expiry: i64, url: &str) -> String {
        // hmac accepts keys of any length, new_from_slice can't fail for sha256
        let mut mac = match HmacSha256::new_from_slice(self.secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return String::new(),
        };

        mac.update(client_id.as_bytes());
        mac.update(expiry.to_string().as_bytes());
        mac.update(url.as_bytes());

        hex::encode(mac.finalize().into_bytes())
    }

    pub fn verify_signature(
        &self,
        client_id: &str,
        expiry: i64,
        url: &str,
        signature: &str,
    ) -> bool {
        if chrono::Utc::now().timestamp() > expiry {
            return false;
        }

        let expected_signature = self.generate_signature(client_id, expiry, url);

        // constant time compare
        signature.len() == expected_signature.len()
            && signature
                .as_bytes()
                .iter()
                .zip(expected_signature.as_bytes().iter())
                .fold(0, |acc, (a, b)| acc | (a ^ b))
                == 0
    }

    pub fn generate_expiry(hours: i64) -> i64 {
        chrono::Utc::now().timestamp() + hours * 3600
    }
}
