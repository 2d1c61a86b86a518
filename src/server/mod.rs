//! Server module
//!
//! Accept loop, per-connection serving and shutdown handling.

pub mod connection;
pub mod listener;
pub mod signal;

pub use listener::create_listener;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::body::Incoming;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::config::Config;
use crate::filter::FilterChain;
use crate::logger::{self, LogFormat};

/// Shared per-request state: the configuration and the filter chain.
/// Both are immutable once the server starts, so requests read them
/// without locks.
pub struct AppState {
    pub config: Config,
    pub chain: FilterChain<Incoming>,
    /// Access log format, parsed once from `config.logging.format`.
    pub log_format: LogFormat,
}

impl AppState {
    pub fn new(config: Config, chain: FilterChain<Incoming>) -> Self {
        let log_format = LogFormat::from(config.logging.format.as_str());
        Self {
            config,
            chain,
            log_format,
        }
    }
}

/// Runs the accept loop until `shutdown` fires, then waits briefly for
/// in-flight connections to finish.
pub async fn run(listener: TcpListener, state: Arc<AppState>, shutdown: Arc<Notify>) {
    let conn_counter = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    connection::accept_connection(stream, peer_addr, &state, &conn_counter);
                }
                Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
            },
            () = shutdown.notified() => break,
        }
    }

    drain_connections(&conn_counter).await;
    logger::log_shutdown_complete();
}

/// Polls the connection counter until it reaches zero or the drain
/// window closes.
async fn drain_connections(conn_counter: &AtomicUsize) {
    const DRAIN_LIMIT: Duration = Duration::from_secs(5);
    const POLL_INTERVAL: Duration = Duration::from_millis(100);

    let started = std::time::Instant::now();
    while conn_counter.load(Ordering::SeqCst) > 0 {
        if started.elapsed() >= DRAIN_LIMIT {
            logger::log_warning(&format!(
                "Shutting down with {} connections still active",
                conn_counter.load(Ordering::SeqCst)
            ));
            break;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AssetsConfig, LoggingConfig, PerformanceConfig, ServerConfig};
    use crate::filter::NotFound;

    fn test_config(format: &str) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
                backlog: 16,
                mount_prefix: None,
            },
            assets: AssetsConfig {
                source: "assets/style.less".to_string(),
                pattern: "/.*\\.css".to_string(),
            },
            logging: LoggingConfig {
                access_log: false,
                format: format.to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive_timeout: 75,
                read_timeout: 30,
                write_timeout: 30,
                max_connections: None,
            },
        }
    }

    #[test]
    fn test_app_state_parses_log_format_once() {
        let state = AppState::new(test_config("json"), FilterChain::new(Arc::new(NotFound)));
        assert_eq!(state.log_format, LogFormat::Json);

        let custom = AppState::new(
            test_config("$status $request"),
            FilterChain::new(Arc::new(NotFound)),
        );
        assert_eq!(
            custom.log_format,
            LogFormat::Custom("$status $request".to_string())
        );
    }

    #[tokio::test]
    async fn test_drain_returns_when_counter_is_zero() {
        let counter = AtomicUsize::new(0);
        drain_connections(&counter).await;
    }
}
