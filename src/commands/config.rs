// src/commands/config.rs
use anyhow::Result;

use crate::cli::Cli;
use crate::config::{Config, ResolvedConfig, API_KEY_ENV};
use crate::optimizer::Target;

pub fn cmd_init(cli: &Cli, file: &Config, admins: &[String], target: Option<Target>) -> Result<()> {
    let mut config = file.clone();

    if cli.api_key.is_some() {
        config.api_key = cli.api_key.clone();
    }
    if cli.model.is_some() {
        config.model = cli.model.clone();
    }
    if cli.max_tokens.is_some() {
        config.max_tokens = cli.max_tokens;
    }
    if cli.temperature.is_some() {
        config.temperature = cli.temperature;
    }
    if cli.base_url.is_some() {
        config.base_url = cli.base_url.clone();
    }
    if cli.email.is_some() {
        config.email = cli.email.clone();
    }
    if cli.data_dir.is_some() {
        config.data_dir = cli.data_dir.clone();
    }
    if let Some(t) = target {
        config.default_target = Some(t.name().to_string());
    }

    merge_admins(&mut config, admins);
    config.save()?;

    if let Some(email) = &config.email {
        println!("Signed in as: {}", email);
    }
    Ok(())
}

fn merge_admins(config: &mut Config, admins: &[String]) {
    if admins.is_empty() {
        return;
    }
    let list = config.admin_emails.get_or_insert_with(Vec::new);
    for admin in admins {
        let admin = admin.trim().to_lowercase();
        if !admin.is_empty() && !list.contains(&admin) {
            list.push(admin);
        }
    }
}

fn source(cli: bool, file: bool) -> &'static str {
    match (cli, file) {
        (true, _) => "cli/env",
        (false, true) => "config file",
        (false, false) => "default",
    }
}

pub fn cmd_config(cli: &Cli, file: &Config) -> Result<()> {
    let resolved = ResolvedConfig::new(cli, file);
    let path = Config::path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(unknown)".into());

    println!("Config file: {}\n", path);

    let key_source = if cli.api_key.is_some() {
        "cli".to_string()
    } else if file.api_key.is_some() {
        "config file".to_string()
    } else {
        format!("env: {}", API_KEY_ENV)
    };
    println!(
        "api_key:        {} ({})",
        resolved
            .api_key
            .as_deref()
            .map(|k| format!("{}...", k.chars().take(8).collect::<String>()))
            .unwrap_or_else(|| "(not set)".into()),
        key_source
    );
    println!(
        "model:          {} ({})",
        resolved.model,
        source(cli.model.is_some(), file.model.is_some())
    );
    println!(
        "max_tokens:     {} ({})",
        resolved.max_tokens,
        source(cli.max_tokens.is_some(), file.max_tokens.is_some())
    );
    println!(
        "temperature:    {} ({})",
        resolved.temperature,
        source(cli.temperature.is_some(), file.temperature.is_some())
    );
    println!(
        "base_url:       {} ({})",
        resolved.base_url,
        source(cli.base_url.is_some(), file.base_url.is_some())
    );
    println!(
        "email:          {} ({})",
        resolved.email.as_deref().unwrap_or("(anonymous)"),
        source(cli.email.is_some(), file.email.is_some())
    );
    println!(
        "data_dir:       {} ({})",
        resolved.data_dir.display(),
        source(cli.data_dir.is_some(), file.data_dir.is_some())
    );
    println!(
        "default_target: {}",
        resolved.default_target.as_deref().unwrap_or("(generic)")
    );
    println!(
        "admin_emails:   {}",
        if resolved.admin_emails.is_empty() {
            "(none)".to_string()
        } else {
            resolved.admin_emails.join(", ")
        }
    );

    println!("\nPriority: CLI args > config file > env var > defaults");
    Ok(())
}
