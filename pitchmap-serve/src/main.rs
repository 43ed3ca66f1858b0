mod api;
mod error;
mod state;

use argh::FromArgs;

/// Serve video to field calibration and coordinate mapping over HTTP
#[derive(Debug, FromArgs)]
struct Args {
    /// address to bind
    #[argh(option, short = 'H', default = "String::from(\"0.0.0.0\")")]
    host: String,

    /// port to listen on
    #[argh(option, short = 'p', default = "8000")]
    port: u16,

    /// maximum number of calibration sessions kept in memory
    #[argh(option, default = "1024")]
    max_sessions: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();

    let app = api::router(state::AppState::new(args.max_sessions));

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await?;

    log::info!("🚀 Starting pitchmap-serve {}", env!("CARGO_PKG_VERSION"));
    log::info!("🔥 Listening on: http://{}", listener.local_addr()?);
    log::info!("🔧 Press Ctrl+C to stop the server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
}
