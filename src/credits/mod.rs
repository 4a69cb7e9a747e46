// src/credits/mod.rs
//! Per-identity credit ledger.
//!
//! A scope starts with [`ALLOTMENT`] credits. Spending the last one stamps a
//! reset time [`RESET_WINDOW`] in the future; once that time has passed the
//! next load restores the full allotment. Expiry is detected lazily, on load
//! and by whoever polls [`CreditLedger::time_remaining`].

mod clock;
mod store;

pub use clock::{Clock, SystemClock};
#[cfg(test)]
pub use clock::FixedClock;
pub use store::{scope_key, CreditStore, FileCreditStore};
#[cfg(test)]
pub use store::ANONYMOUS_SCOPE;
pub(crate) use store::write_atomic;
#[cfg(test)]
pub use store::MemoryCreditStore;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Credits granted per reset window.
pub const ALLOTMENT: u32 = 2;

/// Cooldown after the allotment is spent.
pub const RESET_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

const RESET_WINDOW_MS: i64 = RESET_WINDOW.as_millis() as i64;

// =============================================================================
// STATE
// =============================================================================

/// Persisted as `{"count": n, "resetTime": ms|null}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditState {
    pub count: u32,
    pub reset_time: Option<i64>,
}

impl Default for CreditState {
    fn default() -> Self {
        Self::initial()
    }
}

impl CreditState {
    pub const fn initial() -> Self {
        Self {
            count: ALLOTMENT,
            reset_time: None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.count == 0
    }

    /// Time left until the allotment is restored, `None` once it has elapsed
    /// or when no reset is pending.
    pub fn time_remaining(&self, now_ms: i64) -> Option<Duration> {
        let reset = self.reset_time?;
        let left = reset - now_ms;
        (left > 0).then(|| Duration::from_millis(left as u64))
    }

    fn is_expired(&self, now_ms: i64) -> bool {
        matches!(self.reset_time, Some(t) if t <= now_ms)
    }

    /// Pure decrement, clamped at zero.
    fn consumed(self, now_ms: i64) -> Self {
        match self.count {
            0 => self,
            1 => Self {
                count: 0,
                reset_time: self.reset_time.or(Some(now_ms + RESET_WINDOW_MS)),
            },
            n => Self {
                count: n - 1,
                reset_time: self.reset_time,
            },
        }
    }

    /// Merge two views of the same scope. Spent credits are never given
    /// back: the lower count wins, and among exhausted views the earliest
    /// reset time wins.
    fn reconcile(self, other: Self) -> Self {
        let count = self.count.min(other.count);
        if count > 0 {
            return Self {
                count,
                reset_time: None,
            };
        }

        let reset_time = [self, other]
            .iter()
            .filter(|s| s.count == 0)
            .filter_map(|s| s.reset_time)
            .min();

        Self { count, reset_time }
    }

    /// Bring a record read from storage back inside the invariants.
    fn normalized(self, now_ms: i64) -> Self {
        if self.is_expired(now_ms) {
            return Self::initial();
        }
        match (self.count, self.reset_time) {
            (0, None) => {
                log::warn!("exhausted credit record had no reset time, starting a new window");
                Self {
                    count: 0,
                    reset_time: Some(now_ms + RESET_WINDOW_MS),
                }
            }
            (0, Some(t)) if t > now_ms + RESET_WINDOW_MS => {
                log::warn!("credit reset time is beyond one window, clamping it");
                Self {
                    count: 0,
                    reset_time: Some(now_ms + RESET_WINDOW_MS),
                }
            }
            (n, _) if n > ALLOTMENT => Self::initial(),
            (n, Some(_)) if n > 0 => Self {
                count: n,
                reset_time: None,
            },
            _ => self,
        }
    }
}

// =============================================================================
// LEDGER
// =============================================================================

/// Reads and writes one scope's [`CreditState`] through an injected store.
///
/// Storage failures never surface to callers: they are logged and the
/// in-memory state stays authoritative for the session.
pub struct CreditLedger<S, C = SystemClock> {
    store: S,
    clock: C,
    scope: String,
}

impl<S: CreditStore> CreditLedger<S, SystemClock> {
    pub fn new(store: S, scope: impl Into<String>) -> Self {
        Self::with_clock(store, SystemClock, scope)
    }
}

impl<S: CreditStore, C: Clock> CreditLedger<S, C> {
    pub fn with_clock(store: S, clock: C, scope: impl Into<String>) -> Self {
        Self {
            store,
            clock,
            scope: scope.into(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Current state of the scope. Creates the initial record when none
    /// exists and restores the allotment when the reset time has passed.
    pub fn load(&self) -> CreditState {
        let now = self.clock.now_ms();
        match self.read() {
            Some(stored) => {
                let state = stored.normalized(now);
                if state != stored {
                    log::debug!(
                        "credits for {} normalized: {:?} -> {:?}",
                        self.scope,
                        stored,
                        state
                    );
                    self.persist(&state);
                }
                state
            }
            None => {
                let state = CreditState::initial();
                self.persist(&state);
                state
            }
        }
    }

    /// Spend one credit. A zero balance stays at zero.
    ///
    /// The persisted record is re-read first so that concurrent processes
    /// sharing the scope cannot restore credits another one already spent.
    pub fn consume(&self, state: CreditState) -> CreditState {
        let now = self.clock.now_ms();
        let mine = state.normalized(now);
        let base = match self.read() {
            Some(stored) => mine.reconcile(stored.normalized(now)),
            None => mine,
        };

        let next = base.consumed(now);
        log::debug!("credits for {}: {:?} -> {:?}", self.scope, base, next);
        self.persist(&next);
        next
    }

    pub fn is_exhausted(&self, state: &CreditState) -> bool {
        state.is_exhausted()
    }

    pub fn time_remaining(&self, state: &CreditState) -> Option<Duration> {
        state.time_remaining(self.clock.now_ms())
    }

    fn read(&self) -> Option<CreditState> {
        let raw = match self.store.read(&self.scope) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("could not read credits for {}: {}", self.scope, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                log::warn!("discarding unreadable credit record for {}: {}", self.scope, e);
                None
            }
        }
    }

    fn persist(&self, state: &CreditState) {
        let json = match serde_json::to_string(state) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("could not encode credits for {}: {}", self.scope, e);
                return;
            }
        };
        if let Err(e) = self.store.write(&self.scope, &json) {
            log::warn!("could not persist credits for {}: {}", self.scope, e);
        }
    }
}

/// Render a countdown as `HH:MM:SS`.
pub fn format_remaining(left: Duration) -> String {
    let secs = left.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
