use clap::Parser;
use dotenvy::dotenv;
use axum::middleware::from_fn;
use drop_store::api::middleware::request_id::{REQUEST_ID_HEADER, request_id_middleware};
use drop_store::config::ServerConfig;
use drop_store::infrastructure::storage;
use drop_store::services::network::access_url;
use drop_store::{AppState, create_app};
use std::path::PathBuf;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Local-network file drop-box server", long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port for the HTTP server
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory holding the stored files
    #[arg(short, long)]
    storage_dir: Option<PathBuf>,

    /// Directory with the built browser client to serve at `/`
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

impl Args {
    fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = self.storage_dir {
            config.storage_dir = dir;
        }
        if self.static_dir.is_some() {
            config.static_dir = self.static_dir;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drop_store=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting drop-store...");

    let config = args.apply(ServerConfig::from_env());
    info!(
        "⚙️  Config: Bind={}, Max Upload={}, Client Bundle={}",
        config.bind_address(),
        config
            .max_upload_size
            .map(|max| format!("{}MB", max / 1024 / 1024))
            .unwrap_or_else(|| "unlimited".to_string()),
        config
            .static_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    let store = storage::setup_storage(&config).await?;
    let state = AppState::new(store, config.clone());

    // Id is assigned outside the trace layer so the span records it
    let app = create_app(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get(&REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        .layer(from_fn(request_id_middleware));

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(
        "✅ Server running at {}",
        access_url(config.public_base_url.as_deref(), config.port)
    );
    info!("📖 Swagger UI: http://{}/swagger-ui", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
