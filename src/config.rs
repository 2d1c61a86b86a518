use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub assets: AssetsConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub backlog: i32,
    /// Prefix the stylesheet chain is mounted under. Requests beneath it
    /// get the remainder stamped as path info; requests outside it are
    /// matched against their full path.
    pub mount_prefix: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssetsConfig {
    /// Path to the LESS source compiled at startup.
    pub source: String,
    /// Regular expression the whole effective path must match to be
    /// served the compiled CSS.
    pub pattern: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    pub format: String,
    pub access_log_file: Option<String>,
    pub error_log_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("LESSWARE"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.backlog", 128)?
            .set_default("assets.source", "assets/style.less")?
            .set_default("assets.pattern", "/.*\\.css")?
            .set_default("logging.access_log", true)?
            .set_default("logging.format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects option values the server cannot run with.
    fn validate(&self) -> Result<(), config::ConfigError> {
        if let Some(prefix) = &self.server.mount_prefix {
            if !prefix.starts_with('/') || prefix.ends_with('/') {
                return Err(config::ConfigError::Message(format!(
                    "server.mount_prefix must start with `/` and not end with `/`, got `{prefix}`"
                )));
            }
        }
        if self.server.backlog <= 0 {
            return Err(config::ConfigError::Message(
                "server.backlog must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
