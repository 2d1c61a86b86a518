use std::sync::Arc;
use std::time::Instant;

use hyper::body::Incoming;
use tokio::sync::Notify;

use lessware::config::Config;
use lessware::filter::{AssetFilter, FilterChain, NotFound};
use lessware::logger;
use lessware::server::{self, signal, AppState};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    logger::init(&cfg)?;

    // Compile the stylesheet before the runtime exists; a broken source
    // stops startup instead of surfacing as 500s later.
    let mut filter = AssetFilter::new(&cfg.assets.pattern, cfg.assets.source.as_str())?;
    logger::log_compile_started(filter.source());
    let compile_started = Instant::now();
    if let Err(e) = filter.initialize() {
        logger::log_compile_failed(&e);
        return Err(e.into());
    }
    logger::log_compile_finished(
        filter.source(),
        filter.css().map_or(0, |css| css.len()),
        compile_started.elapsed(),
    );

    let chain = FilterChain::new(Arc::new(NotFound)).mount(Arc::new(filter));

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg, chain))
}

async fn async_main(
    cfg: Config,
    chain: FilterChain<Incoming>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr, cfg.server.backlog)?;

    let state = Arc::new(AppState::new(cfg, chain));
    let shutdown = Arc::new(Notify::new());
    signal::start_signal_handler(Arc::clone(&shutdown));

    logger::log_server_start(&addr, &state.config);

    server::run(listener, state, shutdown).await;
    Ok(())
}
