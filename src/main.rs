// main.rs
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use healthgpt::cli::{self, Args, Commands};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let Args { data_dir, provider, model, command } = args;

    let result = match command {
        Commands::Serve { bind } => cli::handle_serve(bind, data_dir, provider, model).await,
        Commands::Analyze { user, lifestyle } => {
            cli::handle_analyze(user, lifestyle.into(), data_dir, provider, model).await
        }
        Commands::Estimate { lifestyle } => cli::handle_estimate(lifestyle.into()),
        Commands::Chat { user, message } => {
            cli::handle_chat(user, message, data_dir, provider, model).await
        }
        Commands::Profile { command } => cli::handle_profile(command, data_dir),
    };

    if let Err(e) = result {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}
