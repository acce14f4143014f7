/// Chat relay configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. Message history is kept in memory when unset.
    pub database_url: Option<String>,
    /// Redis connection string for the topic bus. An in-process bus is used when unset.
    pub redis_url: Option<String>,
    /// Consumer group the relay joins on every subscribed topic.
    pub consumer_group: String,
    /// Room recorded on every history row.
    pub history_room: String,
    /// Port the HTTP server binds to.
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            database_url: optional_var("DATABASE_URL"),
            redis_url: optional_var("REDIS_URL"),
            consumer_group: optional_var("CONSUMER_GROUP").unwrap_or_else(|| "chat".to_string()),
            history_room: optional_var("HISTORY_ROOM").unwrap_or_else(|| "default".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4002),
        }
    }
}

impl Default for Config {
    /// In-memory everything; used by tests.
    fn default() -> Self {
        Self {
            database_url: None,
            redis_url: None,
            consumer_group: "chat".to_string(),
            history_room: "default".to_string(),
            port: 4002,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
