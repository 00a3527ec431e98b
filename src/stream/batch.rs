//! When buffered text is handed downstream.
//!
//! Emitting every few bytes as its own frame means one state update per
//! network read. Holding text until it reaches a word or sentence boundary
//! (or a size cap) costs a little latency and saves most of those updates.

/// Batching heuristic for pending text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    /// Pending text at least this long (in bytes) is always emitted.
    pub max_pending: usize,
}

impl BatchPolicy {
    pub const DEFAULT_MAX_PENDING: usize = 32;

    pub fn new(max_pending: usize) -> Self {
        Self { max_pending }
    }

    /// Emit on every push.
    pub fn immediate() -> Self {
        Self { max_pending: 0 }
    }

    /// Whether `pending` should be emitted now.
    pub fn should_flush(&self, pending: &str) -> bool {
        if pending.is_empty() {
            return false;
        }
        if pending.len() >= self.max_pending {
            return true;
        }
        pending.chars().next_back().is_some_and(is_natural_break)
    }
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_PENDING)
    }
}

fn is_natural_break(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | ',' | '!' | '?' | ';' | ':')
}
