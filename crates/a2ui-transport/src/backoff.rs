//! Binary exponential backoff with a ceiling.

use std::time::Duration;

use a2ui_core::BackoffConfig;

/// Reconnect delay calculator.
///
/// Each call to [`Backoff::next_delay`] returns the current delay and doubles
/// it up to the ceiling. Only [`Backoff::reset`] brings it back to the floor.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

impl Backoff {
    #[must_use]
    pub fn new(config: BackoffConfig) -> Self {
        let max = config.max();
        let initial = config.initial().min(max);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Delay to wait now; advances the next one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self
            .current
            .checked_mul(2)
            .map_or(self.max, |next| next.min(self.max));
        delay
    }

    /// Back to the floor; call after a successful open.
    pub const fn reset(&mut self) {
        self.current = self.initial;
    }
}
