use email_triage::config::TriageConfig;
use email_triage::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = TriageConfig::from_env()?;

    eprintln!("📬 Email Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {:?} (model: {})", config.backend, config.model);
    eprintln!("   Health: http://0.0.0.0:{}/health", config.port);
    eprintln!("   Analyze: POST http://0.0.0.0:{}/analyze\n", config.port);

    server::serve(&config).await?;
    Ok(())
}
