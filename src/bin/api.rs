use link_coach_core::{
    api::start_server,
    audit::AuditLog,
    coaching::{CoachingOptions, CoachingService},
    config::Settings,
    lexicon::Lexicon,
    llm::{gemini::GeminiConfig, GeminiClient, MockGenerator, TextGenerator},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    let settings = Settings::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    if settings.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("🚀 Link-Coach - API Server");
    info!("📍 Port: {}", settings.port);
    info!("Environment: {}", settings.app_env);

    let lexicon = match &settings.lexicon_path {
        Some(path) => Lexicon::from_json_file(path)?,
        None => Lexicon::builtin(),
    };
    info!(version = lexicon.version(), "Lexicon loaded");

    let generator: Arc<dyn TextGenerator> = if settings.use_mock_generator() {
        warn!("⚠️  GEMINI_API_KEY not set, answers come from the mock generator");
        Arc::new(MockGenerator::new())
    } else {
        let config = GeminiConfig {
            temperature: settings.gemini_temperature,
            max_output_tokens: settings.gemini_max_tokens,
            ..GeminiConfig::new(settings.gemini_api_key.clone(), settings.gemini_model.clone())
        };
        Arc::new(GeminiClient::new(config)?)
    };

    let service = CoachingService::new(Arc::new(lexicon), generator)
        .with_audit_log(Arc::new(AuditLog::with_capacity(settings.audit_capacity)))
        .with_options(CoachingOptions::from(&settings));

    info!("✅ Coaching service initialized ({})", service.generator_name());
    info!("📡 Starting API server...");

    start_server(Arc::new(service), settings.port, settings.app_env.clone()).await?;

    Ok(())
}
