//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Server lifecycle logging
//! - Stylesheet compilation logging
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::{AccessLogEntry, LogFormat};

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::config::Config;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    if let Some(writer) = writer::get() {
        writer.write_info(message);
    } else {
        println!("{message}");
    }
}

/// Write to error log
fn write_error(message: &str) {
    if let Some(writer) = writer::get() {
        writer.write_error(message);
    } else {
        eprintln!("{message}");
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    if let Some(writer) = writer::get() {
        writer.write_access(message);
    } else {
        println!("{message}");
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Stylesheet server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Serving pattern: {}", config.assets.pattern));
    write_info(&format!("LESS source: {}", config.assets.source));
    if let Some(prefix) = &config.server.mount_prefix {
        write_info(&format!("Mount prefix: {prefix}"));
    }
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_compile_started(source: &Path) {
    write_info(&format!("[Compile] Compiling {}", source.display()));
}

pub fn log_compile_finished(source: &Path, bytes: usize, elapsed: Duration) {
    write_info(&format!(
        "[Compile] {} -> {bytes} bytes of CSS in {}ms",
        source.display(),
        elapsed.as_millis()
    ));
}

/// Log a failed compilation with the full error chain.
pub fn log_compile_failed(err: &(dyn std::error::Error + 'static)) {
    write_error(&format!(
        "[ERROR] Stylesheet compilation failed: {}",
        error_chain(err)
    ));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_shutdown_signal(signal: &str) {
    write_info(&format!("\n[Shutdown] Received {signal}, stopping accept loop"));
}

pub fn log_shutdown_complete() {
    write_info("[Shutdown] Server stopped");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &LogFormat) {
    write_access(&entry.format(format));
}

/// Flattens an error and its sources into one line.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "outer failure")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_error_chain_joins_sources() {
        let err = Outer(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file missing",
        ));
        assert_eq!(error_chain(&err), "outer failure: file missing");
    }

    #[test]
    fn test_error_chain_single_error() {
        let err = std::io::Error::other("lonely");
        assert_eq!(error_chain(&err), "lonely");
    }
}
