// src/commands/credits.rs
use anyhow::Result;
use std::io::{self, Write};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::access::{Identity, Quota};
use crate::config::ResolvedConfig;
use crate::credits::{format_remaining, Clock, CreditLedger, CreditState, CreditStore, ALLOTMENT};

use super::{access_policy, cancel_on_ctrl_c, identity, open_ledger};

pub async fn cmd_credits(config: &ResolvedConfig, watch: bool) -> Result<()> {
    let identity = identity(config);
    let ledger = open_ledger(config, &identity);

    let state = match access_policy(config).quota(&identity, &ledger) {
        Quota::Unlimited => {
            println!("Credits: unlimited ({}, admin)", identity.display());
            return Ok(());
        }
        Quota::Limited(state) => state,
    };

    print_status(&identity, &ledger, &state);

    if !watch || !ledger.is_exhausted(&state) {
        return Ok(());
    }

    let cancel = cancel_on_ctrl_c();
    let refilled = wait_for_refill(&ledger, state, Duration::from_secs(1), &cancel, |left| {
        print!("\rRefill in {} ", format_remaining(left));
        let _ = io::stdout().flush();
    })
    .await;

    println!();
    match refilled {
        Some(fresh) => println!("Credits restored: {}/{}", fresh.count, ALLOTMENT),
        None => println!("Canceled."),
    }
    Ok(())
}

fn print_status<S: CreditStore, C: Clock>(
    identity: &Identity,
    ledger: &CreditLedger<S, C>,
    state: &CreditState,
) {
    println!("Credits: {}/{} ({})", state.count, ALLOTMENT, identity.display());
    match ledger.time_remaining(state) {
        Some(left) if ledger.is_exhausted(state) => {
            println!("Out of credits. Refill in {}.", format_remaining(left));
        }
        _ => println!("Each optimization uses one credit."),
    }
}

/// Tick until the reset time passes, then re-derive the state from the
/// ledger. Returns `None` when cancelled first.
pub(crate) async fn wait_for_refill<S: CreditStore, C: Clock>(
    ledger: &CreditLedger<S, C>,
    state: CreditState,
    tick: Duration,
    cancel: &CancellationToken,
    mut on_tick: impl FnMut(Duration),
) -> Option<CreditState> {
    let mut interval = tokio::time::interval(tick);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            _ = interval.tick() => {}
        }

        match ledger.time_remaining(&state) {
            Some(left) => on_tick(left),
            None => {
                let fresh = ledger.load();
                log::info!("credit window for {} elapsed", ledger.scope());
                return Some(fresh);
            }
        }
    }
}
