use bi_analyzer::app::{create_app, init_tracing};
use bi_analyzer::config::Config;
use bi_analyzer::state::AppState;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let env_file = dotenvy::dotenv().ok();

    // Missing API keys are fatal before anything else starts
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.effective_log_level());
    if let Some(path) = env_file {
        info!("Loaded environment file {}", path.display());
    }

    info!("Starting Business Intelligence Analyzer...");
    info!("Configuration loaded: {:?}", config);

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to create upstream clients: {}", e);
            std::process::exit(1);
        }
    };
    let app = create_app(state);

    // Create TCP listener
    let listener = match tokio::net::TcpListener::bind(&config.bind_address()).await {
        Ok(listener) => {
            info!("Server running on {}", config.server_url());
            info!("Dashboard: GET /");
            info!("Analysis endpoint: POST /api/analyze");
            listener
        }
        Err(e) => {
            error!("Failed to bind to {}: {}", config.bind_address(), e);
            std::process::exit(1);
        }
    };

    // Start the server
    info!("Server starting...");
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    } else {
        info!("Server shutdown gracefully");
    }
}
