use rand::Rng;
use std::time::Duration;

/// Retry schedule for transient HTTP failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retry_limit: u16,
    pub backoff: Duration,
    pub max_delay: Duration,
    /// Relative jitter applied to every delay, `0.0` disables it.
    pub fluctuation: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_limit: 5,
            backoff: Duration::from_millis(100),
            max_delay: Duration::from_secs(120),
            fluctuation: 0.0,
        }
    }
}

impl RetryPolicy {
    /// Policy without any sleeping between attempts.
    pub fn immediate(retry_limit: u16) -> Self {
        Self {
            retry_limit,
            backoff: Duration::ZERO,
            max_delay: Duration::ZERO,
            fluctuation: 0.0,
        }
    }

    pub fn delay_for(&self, retry_count: u16) -> Duration {
        calc_retry_duration(self.backoff, self.max_delay, self.retry_limit, self.fluctuation)(
            retry_count,
        )
    }
}

pub enum MaybeRetry<A, B> {
    Through(A),
    Retry { err: B, msg: String },
}

/// Statuses worth another attempt.
pub const RETRY_STATUSES: [u16; 4] = [500, 502, 503, 504];

pub fn is_retryable_status(status: u16) -> bool {
    RETRY_STATUSES.contains(&status)
}

/// Exponential backoff: no wait before the first retry, then `backoff * 2^(n-1)`.
pub fn calc_retry_duration(
    backoff: Duration,
    upper: Duration,
    retry_limit: u16,
    fr: f32,
) -> impl Fn(u16) -> Duration {
    move |retry_count: u16| -> Duration {
        if retry_count <= 1 || retry_limit < retry_count {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow((retry_count - 1) as u32);
        let y = backoff.saturating_mul(factor).min(upper);
        let y = fluctuate(y.as_millis() as f32, fr);
        Duration::from_millis(y.max(0.0) as u64)
    }
}

fn fluctuate(y: f32, fr: f32) -> f32 {
    let r = y * fr;
    if r > 0.0 {
        let mut rng = rand::rng();
        let v = rng.random_range(0.0..(r * 2.0)) - r;
        y + v
    } else {
        y
    }
}
