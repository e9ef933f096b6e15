//! Video-to-quiz pipeline worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vquiz_ai::{GeminiClient, SpeechClient, VisionClient};
use vquiz_store::MemoryJobStore;
use vquiz_worker::{PipelineContext, PipelineRunner, WorkerConfig};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vquiz=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting vquiz-worker");

    // Load configuration
    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    // Build capability adapters
    let gemini = match GeminiClient::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to create Gemini client: {}", e);
            std::process::exit(1);
        }
    };
    let speech = match SpeechClient::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to create Speech client: {}", e);
            std::process::exit(1);
        }
    };
    let vision = match VisionClient::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to create Vision client: {}", e);
            std::process::exit(1);
        }
    };

    let ctx = PipelineContext {
        config,
        store: Arc::new(MemoryJobStore::new()),
        transcriber: speech,
        detector: vision,
        generator: gemini,
    };

    let runner = Arc::new(PipelineRunner::new(ctx));

    // Setup signal handlers
    let shutdown_runner = runner.clone();
    let shutdown_handle = tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_runner.shutdown();
    });

    // Run the queue consumer
    if let Err(e) = runner.run().await {
        error!("Runner error: {}", e);
        std::process::exit(1);
    }

    shutdown_handle.abort();

    info!("Worker shutdown complete");
}
