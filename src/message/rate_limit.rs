//! Cool-down tracking for `NET_RATE_LIMITED`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::client::ChatMode;
use crate::error::SessionError;
use crate::protocol::MAX_RETRY_AFTER_SECS;

/// Deadline used when `now + retry_after` does not fit in an `Instant`.
const FALLBACK_COOLDOWN: Duration = Duration::from_secs(MAX_RETRY_AFTER_SECS);

#[derive(Debug, Clone)]
struct Cooldown {
    until: Instant,
    provider: Option<String>,
}

/// Per-mode send gate.
///
/// Only the mode whose job received the event is blocked; a `lite` send is
/// not held back by a cloud provider's quota.
#[derive(Debug, Clone, Default)]
pub struct RateLimitGate {
    cooldowns: HashMap<ChatMode, Cooldown>,
}

impl RateLimitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block `mode` until `now + retry_after`. An earlier deadline never
    /// replaces a later one.
    pub fn record(
        &mut self,
        mode: ChatMode,
        retry_after: Duration,
        provider: Option<String>,
        now: Instant,
    ) {
        let until = now
            .checked_add(retry_after)
            .or_else(|| now.checked_add(FALLBACK_COOLDOWN))
            .unwrap_or(now);
        match self.cooldowns.get_mut(&mode) {
            Some(existing) if existing.until >= until => {
                if provider.is_some() {
                    existing.provider = provider;
                }
            }
            _ => {
                self.cooldowns.insert(mode, Cooldown { until, provider });
            }
        }
        tracing::info!(mode = %mode, retry_after_secs = retry_after.as_secs(), "Rate limit recorded");
    }

    /// Time left before `mode` may send again, if any.
    pub fn remaining(&self, mode: ChatMode, now: Instant) -> Option<Duration> {
        self.cooldowns
            .get(&mode)
            .map(|c| c.until.saturating_duration_since(now))
            .filter(|d| !d.is_zero())
    }

    pub fn provider(&self, mode: ChatMode) -> Option<&str> {
        self.cooldowns.get(&mode).and_then(|c| c.provider.as_deref())
    }

    /// `Ok` if `mode` may send at `now`.
    pub fn check(&self, mode: ChatMode, now: Instant) -> Result<(), SessionError> {
        match self.remaining(mode, now) {
            Some(retry_after) => Err(SessionError::RateLimited {
                mode,
                retry_after,
                provider: self.provider(mode).map(str::to_string),
            }),
            None => Ok(()),
        }
    }

    /// Drop expired cool-downs.
    pub fn prune(&mut self, now: Instant) {
        self.cooldowns.retain(|_, c| c.until > now);
    }

    pub fn clear(&mut self, mode: ChatMode) {
        self.cooldowns.remove(&mode);
    }
}
