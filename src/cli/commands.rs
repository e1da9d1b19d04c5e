use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::StressLevel;

#[derive(Parser)]
#[command(name = "healthgpt", version, about = "Lifestyle risk dashboard backed by a chat-completion model")]
pub struct Args {
    /// Data directory holding config.json and the profile file
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Provider name from config.json (groq, openai, ollama)
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Model identifier, overriding the provider default
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Lifestyle form fields, bounded like the dashboard sliders.
#[derive(clap::Args, Debug, Clone)]
pub struct LifestyleArgs {
    /// Sleep (hours)
    #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(0..=12))]
    pub sleep: u32,
    /// Exercise (days/week)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(0..=7))]
    pub exercise: u32,
    /// Water (glasses/day)
    #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(0..=15))]
    pub water: u32,
    /// Screen time (hours/day)
    #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(0..=16))]
    pub screen: u32,
    /// Stress level (low, medium, high)
    #[arg(long, default_value = "medium")]
    pub stress: StressLevel,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web dashboard
    Serve {
        /// Listen address, overriding config.json
        #[arg(long)]
        bind: Option<String>,
    },
    /// Send a lifestyle snapshot to the model and save the assessment
    Analyze {
        #[arg(long)]
        user: String,
        #[command(flatten)]
        lifestyle: LifestyleArgs,
    },
    /// Show the local risk breakdown without calling the model
    Estimate {
        #[command(flatten)]
        lifestyle: LifestyleArgs,
    },
    /// One turn with the health assistant
    Chat {
        #[arg(long)]
        user: String,
        message: String,
    },
    /// Inspect stored profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show one profile
    Show {
        #[arg(long)]
        user: String,
        /// Print the raw JSON record
        #[arg(long)]
        json: bool,
    },
    /// List known usernames
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let args = Args::try_parse_from([
            "healthgpt", "analyze", "--user", "alice", "--sleep", "5", "--stress", "high",
        ])
        .unwrap();
        match args.command {
            Commands::Analyze { user, lifestyle } => {
                assert_eq!(user, "alice");
                assert_eq!(lifestyle.sleep, 5);
                assert_eq!(lifestyle.exercise, 3);
                assert_eq!(lifestyle.stress, StressLevel::High);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_slider_bounds_enforced() {
        assert!(Args::try_parse_from(["healthgpt", "estimate", "--sleep", "13"]).is_err());
        assert!(Args::try_parse_from(["healthgpt", "estimate", "--exercise", "8"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let args = Args::try_parse_from([
            "healthgpt", "chat", "--user", "bob", "hi", "--provider", "ollama", "--model", "llama3",
        ])
        .unwrap();
        assert_eq!(args.provider.as_deref(), Some("ollama"));
        assert_eq!(args.model.as_deref(), Some("llama3"));
    }
}
