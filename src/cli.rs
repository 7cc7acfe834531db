use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "aoai-cli", version)]
#[command(
    about = "Ask Azure OpenAI, or a model running locally, from your terminal",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Ask GPT a question and get an answer in your terminal
    Question {
        /// Use a local model instead of Azure OpenAI
        #[arg(short, long)]
        local: bool,
    },

    /// Translate a sentence from one language to another
    Translate {
        /// Use a local model instead of Azure OpenAI
        #[arg(short, long)]
        local: bool,
    },

    /// Get current weather information using function calling
    GetWeather,

    /// Create an image from a prompt
    Image {
        /// Download the image to IMAGE_DOWNLOAD_DIR
        #[arg(short, long)]
        download: bool,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Question { .. } => "question",
            Self::Translate { .. } => "translate",
            Self::GetWeather => "get-weather",
            Self::Image { .. } => "image",
        }
    }
}
