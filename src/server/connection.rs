//! Connection handling module
//!
//! Accepts a single TCP connection, serves HTTP/1.1 on it and sends
//! every request through the filter chain.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Body, Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, Version};
use hyper_util::rt::TokioIo;

use crate::filter::PathInfo;
use crate::logger::{self, AccessLogEntry};

use super::AppState;

/// Accept and process a connection, checking limits and logging.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            // Exceeded limit: rollback counter and reject
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
    );
}

/// Serve one connection in a spawned task.
///
/// Configures HTTP/1.1 keep-alive and a whole-connection timeout from
/// the performance settings, then decrements the connection counter
/// when the connection closes.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let keep_alive_timeout = state.config.performance.keep_alive_timeout;
        let timeout_duration = std::time::Duration::from_secs(std::cmp::max(
            state.config.performance.read_timeout,
            state.config.performance.write_timeout,
        ));

        let mut builder = http1::Builder::new();
        if keep_alive_timeout > 0 {
            builder.keep_alive(true);
        }

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |request| {
                let state = Arc::clone(&service_state);
                async move {
                    Ok::<_, std::convert::Infallible>(
                        serve_request(request, &state, peer_addr).await,
                    )
                }
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => logger::log_warning(&format!(
                "Connection timeout after {} seconds",
                timeout_duration.as_secs()
            )),
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Dispatch one request through the chain and write the access log.
async fn serve_request(
    mut request: Request<Incoming>,
    state: &Arc<AppState>,
    peer_addr: SocketAddr,
) -> Response<Full<Bytes>> {
    let started = Instant::now();
    let mut entry = new_log_entry(&request, peer_addr);

    if let Some(prefix) = &state.config.server.mount_prefix {
        if let Some(info) = path_info(request.uri().path(), prefix) {
            request.extensions_mut().insert(info);
        }
    }

    let response = state.chain.dispatch(request).await;

    if state.config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = body_size(&response);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.log_format);
    }

    response
}

/// The path below the mount prefix, if the request path sits under it.
/// The remainder must begin with `/`, so `/static/cssx` is not under
/// the prefix `/static/css` and an exact prefix hit carries no info.
fn path_info(path: &str, prefix: &str) -> Option<PathInfo> {
    let rest = path.strip_prefix(prefix)?;
    if rest.starts_with('/') {
        Some(PathInfo(rest.to_string()))
    } else {
        None
    }
}

fn new_log_entry<B>(request: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        request.method().to_string(),
        request.uri().path().to_string(),
    );
    entry.query = request.uri().query().map(str::to_string);
    entry.http_version = version_label(request.version()).to_string();
    entry.referer = header_value(request, "referer");
    entry.user_agent = header_value(request, "user-agent");
    entry
}

fn header_value<B>(request: &Request<B>, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
}

fn body_size(response: &Response<Full<Bytes>>) -> usize {
    usize::try_from(response.body().size_hint().exact().unwrap_or(0)).unwrap_or(usize::MAX)
}
