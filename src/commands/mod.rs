// src/commands/mod.rs
mod config;
mod credits;
mod models;
mod optimize;
mod prompts;

pub use config::{cmd_config, cmd_init};
pub use credits::cmd_credits;
pub use models::cmd_models;
pub use optimize::cmd_optimize;
pub use prompts::cmd_prompts;

use tokio_util::sync::CancellationToken;

use crate::access::{AccessPolicy, Identity};
use crate::config::ResolvedConfig;
use crate::credits::{CreditLedger, FileCreditStore};

pub(crate) fn identity(config: &ResolvedConfig) -> Identity {
    Identity::new(config.email.clone())
}

pub(crate) fn access_policy(config: &ResolvedConfig) -> AccessPolicy {
    AccessPolicy::new(&config.admin_emails)
}

pub(crate) fn open_ledger(
    config: &ResolvedConfig,
    identity: &Identity,
) -> CreditLedger<FileCreditStore> {
    CreditLedger::new(FileCreditStore::new(&config.data_dir), identity.scope())
}

/// Token cancelled on Ctrl-C so in-flight calls are abandoned explicitly.
pub(crate) fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::debug!("ctrl-c received");
            trigger.cancel();
        }
    });
    token
}
