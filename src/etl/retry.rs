use std::thread;
use std::time::Duration;

use log::warn;

use super::error::EtlError;

/// Retry and timeout settings for the network steps of a run.
///
/// Extraction and conversion are local and never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub attempts: u32,
    /// Fixed pause between two attempts.
    pub delay: Duration,
    /// Ceiling for a single request.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 3,
            delay: Duration::from_secs(30),
            timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Call `f` until it succeeds, fails with a non transient error, or the
    /// attempts are exhausted.  The last error is returned.
    pub fn run<T, F>(&self, step: &str, mut f: F) -> Result<T, EtlError>
    where
        F: FnMut() -> Result<T, EtlError>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                        step, attempt, attempts, e, self.delay
                    );
                    thread::sleep(self.delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
