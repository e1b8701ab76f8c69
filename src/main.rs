use std::time::Duration;

use clap::Parser;
use quizmaker::{
    db::Db,
    names, router,
    services::generator::{GeneratorService, GroqClient},
    AppState,
};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// SQLite database URL.
    #[arg(long, env, default_value = "sqlite:quizmaker.db")]
    database_url: String,

    /// The address to bind to.
    #[arg(short, long, env, default_value = "127.0.0.1:1414")]
    address: String,

    /// API key for the quiz generator.
    #[arg(long, env, default_value = "")]
    groq_api_key: String,

    #[arg(long, env, default_value = names::DEFAULT_GENERATOR_MODEL)]
    generator_model: String,

    /// OpenAI-compatible chat completions endpoint.
    #[arg(long, env, default_value = names::DEFAULT_GENERATOR_URL)]
    generator_url: String,

    /// Upper bound for one generator call, in seconds.
    #[arg(long, env, default_value_t = names::DEFAULT_GENERATOR_TIMEOUT_SECS)]
    generator_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "quizmaker=debug,axum=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();

    if args.groq_api_key.is_empty() {
        tracing::warn!("GROQ_API_KEY is not set, quiz generation will fail");
    }

    let db = Db::new(&args.database_url).await?;
    let generator = GeneratorService::new(
        GroqClient::new(args.groq_api_key, args.generator_model, args.generator_url),
        Duration::from_secs(args.generator_timeout_secs),
    );
    let app = router(AppState::new(db, generator));

    let listener = tokio::net::TcpListener::bind(&args.address).await?;
    tracing::info!("listening on {}", args.address);
    axum::serve(listener, app).await?;

    Ok(())
}
