// src/commands/prompts.rs
use anyhow::{Context, Result};
use std::fs;

use crate::cli::PromptCommands;
use crate::config::ResolvedConfig;
use crate::library::{PromptLibrary, SavedPrompt};

use super::identity;

pub fn cmd_prompts(config: &ResolvedConfig, command: PromptCommands) -> Result<()> {
    let library = PromptLibrary::open(&config.data_dir);
    let owner = identity(config).owner();

    match command {
        PromptCommands::List => {
            let prompts = library.list(&owner)?;
            if prompts.is_empty() {
                println!("No saved prompts yet. Try: promptify optimize \"your idea\"");
                return Ok(());
            }
            print_table(&prompts, true);
        }
        PromptCommands::Community => {
            let prompts = library.community()?;
            if prompts.is_empty() {
                println!("Nobody has shared a prompt yet.");
                return Ok(());
            }
            print_table(&prompts, false);
        }
        PromptCommands::Show { id } => {
            let p = library.get(&owner, &id)?;
            println!("{}", p.to_markdown());
        }
        PromptCommands::Delete { id } => {
            let p = library.delete(&owner, &id)?;
            println!("Deleted {} ({})", p.short_id(), p.title());
        }
        PromptCommands::Share { id, unshare } => {
            let p = library.set_public(&owner, &id, !unshare)?;
            if p.is_public {
                println!("Shared {} to the community list.", p.short_id());
            } else {
                println!("{} is private again.", p.short_id());
            }
        }
        PromptCommands::Export { id, output } => {
            let p = library.get(&owner, &id)?;
            match output {
                Some(path) => {
                    fs::write(&path, p.to_markdown())
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported {} to {}", p.short_id(), path.display());
                }
                None => print!("{}", p.to_markdown()),
            }
        }
    }

    Ok(())
}

fn print_table(prompts: &[SavedPrompt], show_visibility: bool) {
    for p in prompts {
        let visibility = if show_visibility && p.is_public { " [shared]" } else { "" };
        println!(
            "{} | {} | {:8} | {}{}",
            p.short_id(),
            p.created_at.format("%Y-%m-%d"),
            p.target.to_string().chars().take(8).collect::<String>(),
            p.title(),
            visibility
        );
    }
    println!("\n{} prompt(s)", prompts.len());
}
