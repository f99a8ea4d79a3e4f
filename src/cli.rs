use clap::{Parser, Subcommand};
use crate::ai_provider::AiProvider;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "repair-advisor")]
#[command(about = "Photo-based home repair diagnosis and DIY repair plans", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// AI provider (openai/gemini); overrides the config file
    #[arg(long, global = true)]
    pub ai_provider: Option<AiProvider>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a photo of the damage and print a repair plan
    Analyze {
        /// Photo of the problem area
        #[arg(required = true)]
        image: PathBuf,

        /// What is wrong, in your own words
        #[arg(short, long)]
        description: String,

        /// DIY experience (beginner/intermediate/advanced)
        #[arg(short, long)]
        skill_level: Option<String>,

        /// Budget preference (e.g. tight/moderate/flexible)
        #[arg(short, long)]
        budget: Option<String>,

        /// Location used for price estimates
        #[arg(short, long)]
        location: Option<String>,

        /// Save the full result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the full result as JSON instead of the narrative
        #[arg(long)]
        json: bool,
    },

    /// Show or change settings
    Config {
        /// Store an API key for the current provider
        #[arg(long)]
        set_api_key: Option<String>,

        /// Print current settings
        #[arg(long)]
        show: bool,
    },
}
