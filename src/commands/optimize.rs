// src/commands/optimize.rs
use anyhow::{bail, Context, Result};
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::access::Quota;
use crate::client::{is_cancelled, LlmClient};
use crate::config::ResolvedConfig;
use crate::credits::{format_remaining, ALLOTMENT};
use crate::gemini::ImageAttachment;
use crate::library::PromptLibrary;
use crate::optimizer::{self, OptimizedPrompt, Target};

use super::{access_policy, cancel_on_ctrl_c, identity, open_ledger};

fn read_idea(words: Vec<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read idea from {}", path.display()));
    }

    let from_stdin = matches!(words.as_slice(), [dash] if dash == "-")
        || (words.is_empty() && !io::stdin().is_terminal());
    if from_stdin {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }

    Ok(words.join(" "))
}

fn resolve_target(arg: Option<Target>, config: &ResolvedConfig) -> Target {
    arg.or_else(|| {
        let name = config.default_target.as_deref()?;
        let target = Target::from_name(name);
        if target.is_none() {
            log::warn!("unknown default_target '{}' in config, using generic", name);
        }
        target
    })
    .unwrap_or_default()
}

/// A validated `optimize` invocation.
pub(crate) struct OptimizeRequest {
    pub idea: String,
    pub target: Target,
    pub image: Option<ImageAttachment>,
    pub save: bool,
    pub json: bool,
}

#[allow(clippy::too_many_arguments)]
pub async fn cmd_optimize(
    config: &ResolvedConfig,
    client: &LlmClient,
    idea: Vec<String>,
    file: Option<PathBuf>,
    target: Option<Target>,
    image: Option<PathBuf>,
    save: bool,
    json: bool,
) -> Result<()> {
    let idea = read_idea(idea, file)?;
    if optimizer::sanitize_idea(&idea).is_empty() {
        bail!(
            "Describe your app idea first, e.g. promptify optimize \"a habit tracker with streaks\""
        );
    }

    let request = OptimizeRequest {
        target: resolve_target(target, config),
        image: image.as_deref().map(optimizer::load_image).transpose()?,
        idea,
        save,
        json,
    };
    run_optimize(config, client, request, &cancel_on_ctrl_c()).await
}

pub(crate) async fn run_optimize(
    config: &ResolvedConfig,
    client: &LlmClient,
    request: OptimizeRequest,
    cancel: &CancellationToken,
) -> Result<()> {
    let OptimizeRequest {
        idea,
        target,
        image,
        save,
        json,
    } = request;

    let identity = identity(config);
    let ledger = open_ledger(config, &identity);
    let quota = access_policy(config).quota(&identity, &ledger);

    if !quota.allows() {
        let wait = match quota {
            Quota::Limited(state) => ledger.time_remaining(&state).map(format_remaining),
            Quota::Unlimited => None,
        }
        .unwrap_or_else(|| "a moment".into());
        eprintln!("You have used all {} credits. They refill in {}.", ALLOTMENT, wait);
        eprintln!("Run `promptify credits --watch` for a live countdown.");
        bail!("Out of credits");
    }

    if config.api_key.is_none() {
        bail!("No Gemini API key. Set GEMINI_API_KEY or run `promptify --api-key <KEY> init`.");
    }

    if !json {
        eprintln!("Optimizing for {}...", target);
    }

    let result = match optimizer::optimize(client, &idea, target, image.as_ref(), cancel).await {
        Ok(r) => r,
        Err(e) if is_cancelled(&e) => {
            eprintln!("No credit was used.");
            bail!("Canceled");
        }
        Err(e) => return Err(e),
    };

    // Only successful optimizations cost a credit
    let quota = quota.spend(&ledger);

    let saved_id = if save {
        let library = PromptLibrary::open(&config.data_dir);
        match library.add(&identity.owner(), &idea, target, &result) {
            Ok(saved) => Some(saved.short_id()),
            Err(e) => {
                log::warn!("could not save prompt: {}", e);
                None
            }
        }
    } else {
        None
    };

    if json {
        print_json(&result, target, saved_id.as_deref(), &quota)?;
    } else {
        print_text(&result, saved_id.as_deref(), &quota);
    }
    Ok(())
}

fn print_text(result: &OptimizedPrompt, saved_id: Option<&str>, quota: &Quota) {
    println!("{}", result.prompt);

    if !result.suggestions.is_empty() {
        println!("\nSuggestions:");
        for s in &result.suggestions {
            println!("  - {}", s);
        }
    }

    println!();
    if let Some(id) = saved_id {
        println!("Saved as {} (promptify prompts show {})", id, id);
    }
    println!("Credits left: {}", quota.describe());
}

fn print_json(
    result: &OptimizedPrompt,
    target: Target,
    saved_id: Option<&str>,
    quota: &Quota,
) -> Result<()> {
    let credits = match quota {
        Quota::Unlimited => serde_json::Value::Null,
        Quota::Limited(state) => serde_json::to_value(state)?,
    };
    let out = serde_json::json!({
        "prompt": result.prompt,
        "suggestions": result.suggestions,
        "target": target,
        "id": saved_id,
        "credits": credits,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

// =============================================================================
// MODULE TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::credits::CreditState;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn make_config(base_url: &str, data_dir: &std::path::Path) -> ResolvedConfig {
        ResolvedConfig {
            api_key: Some("test-key".into()),
            base_url: base_url.into(),
            email: Some("maker@example.com".into()),
            data_dir: data_dir.to_path_buf(),
            ..ResolvedConfig::for_tests()
        }
    }

    fn request(save: bool) -> OptimizeRequest {
        OptimizeRequest {
            idea: "a habit tracker with streaks".into(),
            target: Target::Lovable,
            image: None,
            save,
            json: true,
        }
    }

    fn credits_left(config: &ResolvedConfig) -> CreditState {
        open_ledger(config, &identity(config)).load()
    }

    #[tokio::test]
    async fn success_spends_one_credit_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-2.5-flash:generateContent");
                then.status(200).json_body(json!({
                    "candidates": [{"content": {"parts": [
                        {"text": "{\"prompt\":\"Build a streak app\",\"suggestions\":[\"Add reminders\"]}"}
                    ]}}]
                }));
            })
            .await;
        let config = make_config(&server.base_url(), dir.path());
        let client = LlmClient::new(&config).unwrap();

        run_optimize(&config, &client, request(true), &CancellationToken::new())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(credits_left(&config).count, 1);
        let saved = PromptLibrary::open(dir.path()).list("maker@example.com").unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].prompt, "Build a streak app");
    }

    #[tokio::test]
    async fn failed_request_costs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(500)
                    .json_body(json!({"error": {"message": "backend down"}}));
            })
            .await;
        let config = make_config(&server.base_url(), dir.path());
        let client = LlmClient::new(&config).unwrap();

        let err = run_optimize(&config, &client, request(true), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("temporarily unavailable"));
        assert_eq!(credits_left(&config), CreditState::initial());
        assert!(PromptLibrary::open(dir.path())
            .list("maker@example.com")
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn cancelled_request_fails_and_keeps_credit() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200)
                    .delay(Duration::from_secs(5))
                    .json_body(json!({"candidates": [{"content": {"parts": [{"text": "late"}]}}]}));
            })
            .await;
        let config = make_config(&server.base_url(), dir.path());
        let client = LlmClient::new(&config).unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = run_optimize(&config, &client, request(true), &cancel)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Canceled");
        assert_eq!(credits_left(&config), CreditState::initial());
    }

    #[tokio::test]
    async fn exhausted_user_never_reaches_the_api() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200);
            })
            .await;
        let config = make_config(&server.base_url(), dir.path());
        let client = LlmClient::new(&config).unwrap();
        let ledger = open_ledger(&config, &identity(&config));
        ledger.consume(ledger.consume(ledger.load()));

        let err = run_optimize(&config, &client, request(false), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Out of credits");
        mock.assert_hits_async(0).await;
    }

    #[test]
    fn read_idea_joins_words() {
        let idea = read_idea(vec!["a".into(), "todo".into(), "app".into()], None).unwrap();
        assert_eq!(idea, "a todo app");
    }

    #[test]
    fn read_idea_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idea.txt");
        std::fs::write(&path, "Recipe box\nwith tags").unwrap();
        assert_eq!(read_idea(vec![], Some(path)).unwrap(), "Recipe box\nwith tags");
    }

    #[test]
    fn read_idea_missing_file_has_context() {
        let err = read_idea(vec![], Some(PathBuf::from("/nonexistent/idea.txt"))).unwrap_err();
        assert!(err.to_string().contains("Cannot read idea"));
    }

    #[test]
    fn target_prefers_cli_then_config() {
        let mut config = ResolvedConfig::for_tests();
        config.default_target = Some("Cursor".into());
        assert_eq!(resolve_target(Some(Target::Bolt), &config), Target::Bolt);
        assert_eq!(resolve_target(None, &config), Target::Cursor);

        config.default_target = Some("windsurf".into());
        assert_eq!(resolve_target(None, &config), Target::Generic);

        config.default_target = None;
        assert_eq!(resolve_target(None, &config), Target::Generic);
    }
}
