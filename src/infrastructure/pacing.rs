//! Randomized politeness delays between outbound requests

use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::domain::errors::ConfigurationError;

/// Random wait drawn uniformly from `[min_ms, max_ms]` before every request
/// except the first one of a run.
#[derive(Debug, Clone)]
pub struct PolitenessDelay {
    label: &'static str,
    min_ms: u64,
    max_ms: u64,
    first: bool,
}

impl PolitenessDelay {
    pub fn new(label: &'static str, min_ms: u64, max_ms: u64) -> Result<Self, ConfigurationError> {
        if min_ms > max_ms {
            return Err(ConfigurationError::InvalidDelayRange { min_ms, max_ms });
        }
        Ok(Self { label, min_ms, max_ms, first: true })
    }

    pub fn next_delay(&self) -> Duration {
        Duration::from_millis(fastrand::u64(self.min_ms..=self.max_ms))
    }

    /// Wait before a request; the first call of a run returns immediately
    pub async fn wait(&mut self) {
        if std::mem::replace(&mut self.first, false) {
            return;
        }
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        debug!("Waiting {:?} ({} delay)", delay, self.label);
        sleep(delay).await;
    }
}
