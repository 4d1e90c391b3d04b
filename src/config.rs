/// process configuration, read once at startup (teacher idiom:
/// `std::env::var(..).expect(..)` in `save/postgres/connect.rs`).
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub default_category: String,
    /// required only for catalog ingestion; unused by the core, kept so
    /// config validation doesn't reject deployments that set it.
    pub tmdb_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into()),
            database_url: std::env::var("DATABASE_URL").ok(),
            default_category: std::env::var("PREFCRAFT_CATEGORY")
                .unwrap_or_else(|_| "fountain_pens".into()),
            tmdb_api_key: std::env::var("TMDB_API_KEY").ok(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            database_url: None,
            default_category: "fountain_pens".into(),
            tmdb_api_key: None,
        }
    }
}
