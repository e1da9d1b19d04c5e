use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{Context, Result};
use colored::*;

use crate::ai_provider::{AIProviderClient, ChatCompletion, Role};
use crate::config::Config;
use crate::core::{LifestyleInput, ProfileStore, RiskAssessment};
use crate::service::{HealthService, ServiceSettings};
use crate::web;

pub use commands::{Args, Commands, LifestyleArgs, ProfileCommands};

mod commands;

impl From<LifestyleArgs> for LifestyleInput {
    fn from(args: LifestyleArgs) -> Self {
        LifestyleInput::new(args.sleep, args.exercise, args.water, args.screen, args.stress)
    }
}

/// Wire config, store and provider together. Fails when the provider
/// needs a key and none is configured.
pub fn build_service(config: &Config, provider: Option<String>, model: Option<String>) -> Result<HealthService> {
    let ai_config = config.get_ai_config(provider, model)?;
    let client = AIProviderClient::new(ai_config)
        .context("Failed to create chat-completion client")?;
    tracing::info!(provider = %client.get_provider(), model = %client.model(), "chat-completion client ready");
    let store = ProfileStore::new(config.profile_path())
        .context("Failed to open profile store")?;

    Ok(HealthService::new(store, Arc::new(client), ServiceSettings::from(config)))
}

pub async fn handle_serve(
    bind: Option<String>,
    data_dir: Option<PathBuf>,
    provider: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let config = Config::new(data_dir)?;
    let service = build_service(&config, provider, model)?;
    let bind = bind.unwrap_or_else(|| config.bind.clone());

    println!("{} http://{}", "Health dashboard on".green(), bind);
    web::serve(Arc::new(service), &bind).await
}

pub async fn handle_analyze(
    user: String,
    input: LifestyleInput,
    data_dir: Option<PathBuf>,
    provider: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let config = Config::new(data_dir)?;
    let service = build_service(&config, provider, model)?;

    println!("{}", "AI analyzing...".dimmed());
    let assessment = service.analyze(&user, input).await?;

    print_breakdown(&assessment);
    match assessment.model_score {
        Some(score) => println!("AI declared score: {}", score.to_string().yellow()),
        None => println!("{}", "AI reply carried no Risk Score line".yellow()),
    }
    if let Some(narrative) = &assessment.narrative_text {
        println!("\n{}", "AI Health Assessment".cyan().bold());
        println!("{}", narrative);
    }

    Ok(())
}

pub fn handle_estimate(input: LifestyleInput) -> Result<()> {
    print_breakdown(&RiskAssessment::local(&input.clamped()));
    Ok(())
}

pub async fn handle_chat(
    user: String,
    message: String,
    data_dir: Option<PathBuf>,
    provider: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let config = Config::new(data_dir)?;
    let service = build_service(&config, provider, model)?;

    let turn = service.chat(&user, &message).await?;

    println!("{}: {}", "User".cyan(), message);
    println!("{}: {}", "AI".green(), turn.reply);
    println!("{}", format!("({} messages in history)", turn.history.len()).dimmed());

    Ok(())
}

pub fn handle_profile(command: ProfileCommands, data_dir: Option<PathBuf>) -> Result<()> {
    let config = Config::new(data_dir)?;
    let store = ProfileStore::new(config.profile_path())?;

    match command {
        ProfileCommands::List => {
            let usernames = store.usernames()?;
            if usernames.is_empty() {
                println!("No profiles found.");
                return Ok(());
            }
            println!("Profiles ({}):", usernames.len());
            for username in usernames {
                println!("  {}", username);
            }
        }
        ProfileCommands::Show { user, json } => {
            let profile = store
                .get(&user)?
                .ok_or_else(|| anyhow::anyhow!("No profile for {}", user))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
                return Ok(());
            }

            println!("{} {}", "Profile:".cyan().bold(), user.trim());
            println!("Updated: {}", profile.updated_at.format("%Y-%m-%d %H:%M UTC"));
            match profile.last_inputs {
                Some(inputs) => println!(
                    "Last inputs: sleep {}h, exercise {}d/wk, water {} glasses, screen {}h, stress {}",
                    inputs.sleep_hours,
                    inputs.exercise_days,
                    inputs.water_glasses,
                    inputs.screen_hours,
                    inputs.stress_level
                ),
                None => println!("Last inputs: none"),
            }
            if let Some(score) = profile.last_score {
                println!("Last local score: {}", score);
            }
            if let Some(score) = profile.last_model_score {
                println!("Last AI score: {}", score);
            }
            if profile.has_result() {
                println!("\n{}\n{}", "Last Saved Assessment".cyan(), profile.last_result);
            }
            if !profile.chat_history.is_empty() {
                println!("\n{}", "Chat History".cyan());
                for message in &profile.chat_history {
                    let label = match message.role {
                        Role::User => "User".cyan(),
                        Role::Assistant => "AI".green(),
                        Role::System => "System".dimmed(),
                    };
                    println!("{}: {}", label, message.content);
                }
            }
        }
    }

    Ok(())
}

fn print_breakdown(assessment: &RiskAssessment) {
    println!(
        "{} {} ({})",
        "Local risk score:".bold(),
        assessment.total_score,
        assessment.level
    );
    for (name, value) in assessment.component_scores.iter() {
        let bar = "█".repeat(value.clamp(0, 30) as usize / 2);
        println!("  {:<12} {:>3} {}", name, value, bar.blue());
    }
}
