use anyhow::Context;
use redis::AsyncCommands;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::model::CatalogRepository;
use crate::database::RedisDatabase;

fn cache_key(namespace: &str, key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("catalog:{}:{}", namespace, hex::encode(hasher.finalize()))
}

#[async_trait::async_trait]
impl CatalogRepository for RedisDatabase {
    async fn get_cached(&self, namespace: &str, key: &str) -> anyhow::Result<Option<Value>> {
        let mut conn = self.connection.clone();
        let raw: Option<String> = conn
            .get(cache_key(namespace, key))
            .await
            .context("failed to read catalog cache")?;

        match raw {
            Some(raw) => {
                debug!("catalog cache hit {}:{}", namespace, key);
                Ok(Some(
                    serde_json::from_str(&raw).context("corrupt catalog cache entry")?,
                ))
            }
            None => Ok(None),
        }
    }

    async fn set_cached(
        &self,
        namespace: &str,
        key: &str,
        value: &Value,
        ttl_secs: u64,
    ) -> anyhow::Result<()> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .set_ex(cache_key(namespace, key), value.to_string(), ttl_secs)
            .await
            .context("failed to write catalog cache")?;
        Ok(())
    }

    // SCAN instead of KEYS so a big cache doesn't block the instance
    async fn clear_namespace(&self, namespace: &str) -> anyhow::Result<()> {
        let mut conn = self.connection.clone();
        let pattern = format!("catalog:{}:*", namespace);

        let mut keys: Vec<String> = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut conn)
                .await
                .context("failed to scan catalog cache")?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        if !keys.is_empty() {
            let _: () = conn
                .del(&keys)
                .await
                .context("failed to clear catalog cache")?;
        }

        debug!("cleared {} catalog entries in {}", keys.len(), namespace);
        Ok(())
    }
}
