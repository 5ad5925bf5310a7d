pub mod app_services;
pub mod catalog_services;
pub mod cookie_services;
pub mod football_services;
pub mod moviebox_services;
pub mod rate_limit_services;
pub mod sflix_services;
pub mod sports_services;
pub mod tmdb_services;

pub use catalog_services::DynCatalogService;
pub use cookie_services::DynCookieService;
pub use football_services::DynFootballService;
pub use moviebox_services::DynMovieboxService;
pub use rate_limit_services::DynRateLimitService;
pub use sflix_services::DynSflixService;
pub use sports_services::DynSportsService;
pub use tmdb_services::DynTmdbService;
