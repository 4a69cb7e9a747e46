// src/optimizer.rs
use anyhow::{bail, Context, Result};
use base64::Engine;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::client::LlmClient;
use crate::gemini::ImageAttachment;
use crate::prompts::*;

pub const MAX_IDEA_CHARS: usize = 4000;
pub const MAX_IMAGE_BYTES: u64 = 4 * 1024 * 1024;

// =============================================================================
// TARGET PLATFORM
// =============================================================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Lovable,
    Cursor,
    V0,
    Replit,
    Bolt,
    #[default]
    Generic,
}

impl Target {
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name.trim(), true).ok()
    }

    /// Lowercase name as accepted on the command line and in config.
    pub fn name(self) -> &'static str {
        match self {
            Target::Lovable => "lovable",
            Target::Cursor => "cursor",
            Target::V0 => "v0",
            Target::Replit => "replit",
            Target::Bolt => "bolt",
            Target::Generic => "generic",
        }
    }

    fn guidance(self) -> &'static str {
        match self {
            Target::Lovable => GUIDANCE_LOVABLE,
            Target::Cursor => GUIDANCE_CURSOR,
            Target::V0 => GUIDANCE_V0,
            Target::Replit => GUIDANCE_REPLIT,
            Target::Bolt => GUIDANCE_BOLT,
            Target::Generic => GUIDANCE_GENERIC,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Target::Lovable => "Lovable",
            Target::Cursor => "Cursor",
            Target::V0 => "v0",
            Target::Replit => "Replit",
            Target::Bolt => "Bolt",
            Target::Generic => "any AI coding assistant",
        };
        f.write_str(name)
    }
}

// =============================================================================
// INPUT
// =============================================================================

/// Strip control characters, neutralize code fences and cap the length.
pub fn sanitize_idea(idea: &str) -> String {
    idea.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(MAX_IDEA_CHARS)
        .collect::<String>()
        .replace("```", "'''")
        .trim()
        .to_string()
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

pub fn load_image(path: &Path) -> Result<ImageAttachment> {
    let Some(mime_type) = mime_for(path) else {
        bail!("Unsupported image type: {} (use png, jpg, webp or gif)", path.display());
    };

    let size = std::fs::metadata(path)
        .with_context(|| format!("Cannot read image {}", path.display()))?
        .len();
    if size > MAX_IMAGE_BYTES {
        bail!("Image {} is too large ({} bytes, max {})", path.display(), size, MAX_IMAGE_BYTES);
    }

    let bytes = std::fs::read(path)
        .with_context(|| format!("Cannot read image {}", path.display()))?;
    Ok(ImageAttachment {
        mime_type: mime_type.to_string(),
        data_b64: base64::engine::general_purpose::STANDARD.encode(bytes),
    })
}

pub fn build_system_prompt(target: Target) -> String {
    OPTIMIZE_SYSTEM_PROMPT.replace("{platform_guidance}", target.guidance())
}

pub fn build_user_prompt(idea: &str, target: Target, has_image: bool) -> String {
    OPTIMIZE_USER_PROMPT
        .replace("{target}", &target.to_string())
        .replace("{idea}", idea)
        .replace("{image_note}", if has_image { IMAGE_NOTE } else { "" })
}

// =============================================================================
// OUTPUT
// =============================================================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizedPrompt {
    pub prompt: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

fn strip_code_fence(raw: &str) -> &str {
    let t = raw.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse the model reply. Anything that is not the expected JSON object is
/// kept verbatim as the prompt.
pub fn parse_reply(raw: &str) -> OptimizedPrompt {
    let body = strip_code_fence(raw);

    let parsed = serde_json::from_str::<OptimizedPrompt>(body).ok().or_else(|| {
        let start = body.find('{')?;
        let end = body.rfind('}')?;
        (start < end)
            .then(|| serde_json::from_str::<OptimizedPrompt>(&body[start..=end]).ok())
            .flatten()
    });

    match parsed {
        Some(p) if !p.prompt.trim().is_empty() => OptimizedPrompt {
            prompt: p.prompt.trim().to_string(),
            suggestions: p
                .suggestions
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        },
        _ => {
            log::debug!("reply was not the expected JSON object, using it verbatim");
            OptimizedPrompt {
                prompt: body.to_string(),
                suggestions: Vec::new(),
            }
        }
    }
}

// =============================================================================
// OPTIMIZE
// =============================================================================
pub async fn optimize(
    client: &LlmClient,
    idea: &str,
    target: Target,
    image: Option<&ImageAttachment>,
    cancel: &CancellationToken,
) -> Result<OptimizedPrompt> {
    let idea = sanitize_idea(idea);
    if idea.is_empty() {
        bail!("Describe your app idea first.");
    }

    let system = build_system_prompt(target);
    let user = build_user_prompt(&idea, target, image.is_some());

    log::info!("optimizing {} chars for {} with {}", idea.len(), target, client.model());
    let raw = client.generate(&system, &user, image, true, cancel).await?;
    Ok(parse_reply(&raw))
}
