// src/cli.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::optimizer::Target;

#[derive(Parser)]
#[command(
    name = "promptify",
    version,
    about = "Turn a rough app idea into a detailed prompt for AI coding assistants\n\nEach optimization costs one credit. Credits refill 24 hours after the last one is spent.",
    after_help = "EXAMPLES:
    promptify optimize \"a habit tracker with streaks\"
    promptify optimize --target lovable \"marketplace for used bikes\"
    promptify optimize --file idea.txt --image sketch.png --target v0

    promptify credits                 # Show remaining credits
    promptify credits --watch         # Live countdown until credits refill

    promptify prompts list            # Your saved prompts
    promptify prompts show 3f2a9c1d   # Full prompt by id (prefix is enough)
    promptify prompts share 3f2a9c1d  # Publish to the community list
    promptify prompts community       # Prompts others have shared

    promptify --email me@example.com --api-key <KEY> init"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub api_key: Option<String>,
    #[arg(long, global = true)]
    pub model: Option<String>,
    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,
    #[arg(long, global = true)]
    pub temperature: Option<f32>,
    #[arg(long, env = "GEMINI_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Signed-in identity (selects your credits and saved prompts)
    #[arg(long, env = "PROMPTIFY_EMAIL", global = true)]
    pub email: Option<String>,

    /// Directory for credits and saved prompts
    #[arg(long, env = "PROMPTIFY_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite an app idea into a detailed build prompt (costs one credit)
    ///
    /// The idea can be given as arguments, read from a file, or piped on stdin with `-`.
    Optimize {
        /// The app idea. Use `-` to read it from stdin.
        #[arg(value_name = "IDEA")]
        idea: Vec<String>,

        /// Read the idea from a file
        #[arg(short, long, conflicts_with = "idea")]
        file: Option<PathBuf>,

        /// AI coding assistant the prompt is written for
        #[arg(short, long, value_enum)]
        target: Option<Target>,

        /// Reference image (png, jpg, webp, gif) for layout and style cues
        #[arg(long)]
        image: Option<PathBuf>,

        /// Do not store the result in your prompt library
        #[arg(long)]
        no_save: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show remaining credits and when they refill
    Credits {
        /// Keep a live countdown running until credits refill
        #[arg(short, long)]
        watch: bool,
    },

    /// Manage saved prompts
    Prompts {
        #[command(subcommand)]
        command: PromptCommands,
    },

    /// Create or update `~/.promptify.toml` from the global options
    Init {
        /// Grant unlimited credits to this email (repeatable)
        #[arg(long = "admin", value_name = "EMAIL")]
        admins: Vec<String>,

        /// Default target platform for `optimize`
        #[arg(long, value_enum)]
        target: Option<Target>,
    },

    /// Show the resolved configuration and where each value comes from
    Config,

    /// List Gemini models available to your API key
    Models,
}

#[derive(Subcommand, Clone)]
pub enum PromptCommands {
    /// List your saved prompts, newest first
    List,
    /// Print a saved prompt in full
    Show {
        /// Prompt id or unique prefix
        id: String,
    },
    /// Delete one of your prompts
    Delete {
        /// Prompt id or unique prefix
        id: String,
    },
    /// Publish a prompt to the community list
    Share {
        /// Prompt id or unique prefix
        id: String,
        /// Make a shared prompt private again
        #[arg(long)]
        unshare: bool,
    },
    /// Write a prompt as markdown to a file or stdout
    Export {
        /// Prompt id or unique prefix
        id: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List prompts shared by everyone
    Community,
}
