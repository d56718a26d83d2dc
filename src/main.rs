use roadscan::{app, classifier::ModelStatus, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "roadscan=debug,axum=info,tower_http=info,sqlx=warn".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    match app_state.classifier.status() {
        ModelStatus::Loaded => tracing::info!(
            model = %app_state.config.model_path.display(),
            "classifier ready"
        ),
        ModelStatus::Placeholder => tracing::warn!(
            model = %app_state.config.model_path.display(),
            "no trained model available; uploads will be classified as 'unknown'"
        ),
    }

    let router = app::build_app(app_state);
    app::serve(router).await
}
