pub mod detail_decoder;
pub mod normalize;
pub mod proxy_utils;
pub mod scrape_utils;
pub mod signature_utils;
