use medical_report_service::{ServiceConfig, create_app};
use tokio::net::TcpListener;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // A missing .env file is fine, the variables may come from the environment
    dotenvy::dotenv().ok();

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("⚠ Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let app = create_app(&config);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    let addr = listener.local_addr()?;

    info!("Medical Report Analyzer starting on {} (model {})", addr, config.model);
    info!("Health check endpoint: http://{}/health", addr);
    info!("Upload endpoint: POST http://{}/sessions/{{session_id}}/files", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
