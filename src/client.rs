// src/client.rs
use anyhow::Result;
use reqwest::{Client, Proxy};
use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::config::ResolvedConfig;
use crate::gemini::{self, GenerateParams, ImageAttachment};

/// Returned when a call is abandoned through its cancellation token.
#[derive(Debug, thiserror::Error)]
#[error("request cancelled")]
pub struct Cancelled;

pub fn is_cancelled(err: &anyhow::Error) -> bool {
    err.is::<Cancelled>()
}

pub struct LlmClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl LlmClient {
    pub fn new(config: &ResolvedConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(std::time::Duration::from_secs(120));

        if let Ok(proxy_url) = std::env::var("PROMPTIFY_PROXY") {
            let proxy_url = proxy_url.trim();
            if !proxy_url.is_empty() {
                builder = builder.proxy(Proxy::all(proxy_url)?);
            }
        }

        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single generateContent call. A cancelled token wins over a late
    /// response, which is then dropped.
    pub async fn generate(
        &self,
        system: &str,
        user: &str,
        image: Option<&ImageAttachment>,
        json_output: bool,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let params = GenerateParams {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system,
            user,
            image,
            json_output,
        };

        cancellable(
            cancel,
            gemini::generate(&self.http, &self.base_url, self.api_key.as_deref(), &params),
        )
        .await
    }

    pub async fn list_models(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        cancellable(
            cancel,
            gemini::list_models(&self.http, &self.base_url, self.api_key.as_deref()),
        )
        .await
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            log::debug!("outbound call cancelled");
            Err(Cancelled.into())
        }
        r = fut => r,
    }
}
