// src/gemini.rs
use anyhow::{anyhow, bail, Context, Result};
use reqwest::{Client, StatusCode};

use crate::types::*;

/// Image sent alongside the idea as inline base64 data.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data_b64: String,
}

pub struct GenerateParams<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system: &'a str,
    pub user: &'a str,
    pub image: Option<&'a ImageAttachment>,
    pub json_output: bool,
}

fn normalize_base_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/v1beta") {
        base.to_string()
    } else {
        format!("{}/v1beta", base)
    }
}

fn normalize_model_path(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

fn build_request(params: &GenerateParams<'_>) -> GeminiGenerateContentRequest {
    let mut parts = vec![GeminiPart::text(params.user)];
    if let Some(image) = params.image {
        parts.push(GeminiPart {
            text: None,
            inline_data: Some(GeminiInlineData {
                mime_type: image.mime_type.clone(),
                data: image.data_b64.clone(),
            }),
        });
    }

    GeminiGenerateContentRequest {
        system_instruction: if params.system.trim().is_empty() {
            None
        } else {
            Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart::text(params.system)],
            })
        },
        contents: vec![GeminiContent {
            role: Some("user".into()),
            parts,
        }],
        generation_config: Some(GeminiGenerationConfig {
            temperature: Some(params.temperature),
            max_output_tokens: Some(params.max_tokens),
            response_mime_type: params.json_output.then(|| "application/json".to_string()),
        }),
    }
}

/// Rewrite an HTTP failure into something a user can act on.
pub fn friendly_error(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<ApiError>(body)
        .ok()
        .and_then(|e| e.error)
        .and_then(|d| d.message)
        .unwrap_or_else(|| body.chars().take(300).collect::<String>().trim().to_string());

    let hint = match status.as_u16() {
        400 if detail.contains("API key") => {
            "The Gemini API key is invalid. Check GEMINI_API_KEY or `promptify init --api-key`."
        }
        401 | 403 => {
            "The Gemini API key was rejected. Check GEMINI_API_KEY or `promptify init --api-key`."
        }
        404 => {
            "The requested model was not found. Run `promptify models` to see what is available."
        }
        429 => "The AI service is rate limiting requests. Please wait a minute and try again.",
        500..=599 => "The AI service is temporarily unavailable. Please try again shortly.",
        _ => "The AI service rejected the request.",
    };

    if detail.is_empty() {
        format!("{} ({})", hint, status)
    } else {
        format!("{} ({}: {})", hint, status, detail)
    }
}

pub async fn generate(
    http: &Client,
    base_url: &str,
    api_key: Option<&str>,
    params: &GenerateParams<'_>,
) -> Result<String> {
    let base = normalize_base_url(base_url);
    let url = format!("{}/{}:generateContent", base, normalize_model_path(params.model));
    let request = build_request(params);

    let mut req_builder = http
        .post(&url)
        .header("Content-Type", "application/json")
        .header("Accept", "application/json");

    if let Some(key) = api_key {
        req_builder = req_builder.header("X-goog-api-key", key);
    }

    log::debug!("POST {}", url);
    let response = req_builder
        .json(&request)
        .send()
        .await
        .context("Failed to reach the AI service")?;

    let status = response.status();
    let body = response.text().await.context("Failed to read response body")?;

    if !status.is_success() {
        log::debug!("Gemini error body: {}", body);
        bail!(friendly_error(status, &body));
    }

    let resp: GeminiGenerateContentResponse =
        serde_json::from_str(&body).context("Failed to parse Gemini response")?;

    extract_text(resp)
}

fn extract_text(resp: GeminiGenerateContentResponse) -> Result<String> {
    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        bail!("The idea was blocked by the AI safety filter ({}). Try rephrasing it.", reason);
    }

    let candidate = resp
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| anyhow!("No response content from Gemini API"))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        match candidate.finish_reason.as_deref() {
            Some("MAX_TOKENS") => bail!("The AI response was cut off. Try a larger --max-tokens."),
            Some(reason) => {
                bail!("No response content from Gemini API (finish reason: {})", reason)
            }
            None => bail!("No response content from Gemini API"),
        }
    }

    Ok(text.trim().to_string())
}

pub async fn list_models(
    http: &Client,
    base_url: &str,
    api_key: Option<&str>,
) -> Result<Vec<String>> {
    let base = normalize_base_url(base_url);
    let url = format!("{}/models", base);

    let mut req_builder = http.get(&url).header("Accept", "application/json");

    if let Some(key) = api_key {
        req_builder = req_builder.header("X-goog-api-key", key);
    }

    let response = req_builder.send().await.context("Failed to reach the AI service")?;

    let status = response.status();
    let body = response.text().await.context("Failed to read response body")?;

    if !status.is_success() {
        bail!(friendly_error(status, &body));
    }

    let resp: GeminiModelsResponse =
        serde_json::from_str(&body).context("Failed to parse Gemini models response")?;

    Ok(resp
        .models
        .into_iter()
        .filter(|m| {
            m.supported_generation_methods.is_empty()
                || m.supported_generation_methods.iter().any(|g| g == "generateContent")
        })
        .map(|m| m.name.strip_prefix("models/").unwrap_or(&m.name).to_string())
        .collect())
}
