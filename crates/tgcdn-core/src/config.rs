use std::time::Duration;

use clap::Parser;

/// Process configuration, loaded from the environment (or CLI flags of the
/// same name) at startup. A missing required field is a `clap` parse error,
/// which `main` turns into a fatal exit with a usage message.
#[derive(Debug, Clone, Parser)]
#[command(name = "tgcdn-server", about = "Chat-platform-backed content CDN")]
pub struct Config {
    /// Destination chat for every uploaded document.
    #[arg(long, env = "SENDBOT_CHAT_ID")]
    pub sendbot_chat_id: i64,

    /// Comma-separated upstream credentials; one worker is spawned per token.
    #[arg(long, env = "SENDBOT_TOKENS", value_delimiter = ',')]
    pub sendbot_tokens: Vec<String>,

    #[arg(long, env = "DB_USER")]
    pub db_user: String,
    #[arg(long, env = "DB_PASSWORD")]
    pub db_password: String,
    #[arg(long, env = "DB_HOST")]
    pub db_host: String,
    #[arg(long, env = "DB_PORT", default_value_t = 3306)]
    pub db_port: u16,
    #[arg(long, env = "DB_DATABASE")]
    pub db_database: String,

    #[arg(long, env = "REDIS_URL", default_value = "redis://redis:6379/0")]
    pub redis_url: String,

    #[arg(long, env = "TGCDN_TEMP_DIR", default_value = "/tmp/tg_img_cdn")]
    pub temp_dir: String,

    #[arg(long, env = "TGCDN_WORKER_BATCH_SIZE", default_value_t = 10)]
    pub worker_batch_size: i64,
    #[arg(long, env = "TGCDN_WORKER_POLL_INTERVAL_SECS", default_value_t = 5)]
    pub worker_poll_interval_secs: u64,

    #[arg(long, env = "TGCDN_GC_INTERVAL_SECS", default_value_t = 3600)]
    pub gc_interval_secs: u64,
    #[arg(long, env = "TGCDN_GC_STALE_AFTER_SECS", default_value_t = 600)]
    pub gc_stale_after_secs: i64,

    #[arg(long, env = "TGCDN_OFFLOAD_CHANNEL_CAPACITY", default_value_t = 256)]
    pub offload_channel_capacity: usize,

    #[arg(long, env = "TGCDN_HTTP_ADDR", default_value = "0.0.0.0:8000")]
    pub http_addr: String,
}

impl Config {
    pub fn worker_poll_interval(&self) -> Duration {
        Duration::from_secs(self.worker_poll_interval_secs)
    }

    pub fn gc_interval(&self) -> Duration {
        Duration::from_secs(self.gc_interval_secs)
    }

    pub fn database_url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_database
        )
    }
}
