use std::path::PathBuf;

use clap::Parser;

use route_guard::config;

#[derive(Parser, Debug)]
#[command(author, version, about = "route-guard demo server", long_about = None)]
struct Cli {
    /// JSON configuration document with an `authorization` section
    #[arg(long, env = "AUTHZ_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "APP_PORT", default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let cli = Cli::parse();

    let document = match &cli.config {
        Some(path) => config::load_file(path)?,
        None => config::default_config(),
    };
    let document = config::merge_env(document)?;

    let app = route_guard::create_app(document)?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cli.port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
