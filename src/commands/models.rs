// src/commands/models.rs
use anyhow::Result;

use crate::client::LlmClient;

use super::cancel_on_ctrl_c;

pub async fn cmd_models(client: &LlmClient) -> Result<()> {
    println!("Fetching available models...\n");
    let models = client.list_models(&cancel_on_ctrl_c()).await?;

    if models.is_empty() {
        println!("No models found.");
    } else {
        println!("Available models:");
        for model in models {
            let marker = if model == client.model() { " (current)" } else { "" };
            println!("  {}{}", model, marker);
        }
    }
    Ok(())
}
