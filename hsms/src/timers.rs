use std::time::Duration;
use std::time::Instant;

use crate::error::HsmsError;
use crate::error::Result;

/// The five SEMI transport timers plus the repeating linktest interval, all in one place so
/// they can be reset atomically alongside the state transitions that own them (§5 "Timer
/// discipline" insists these are first-class, not ad-hoc `sleep`s).
#[derive(Debug, Clone, Copy)]
pub struct TimerConfig {
    /// Reply timeout for an outstanding W=1 transaction.
    pub t3: Duration,
    /// Minimum spacing between active-role TCP connect attempts.
    pub t5: Duration,
    /// Reply timeout for outstanding HSMS control messages (Select, Linktest).
    pub t6: Duration,
    /// Time allowed between TCP-up and a successful Select.
    pub t7: Duration,
    /// Maximum gap between bytes within one frame.
    pub t8: Duration,
    /// Period between Linktest.req sends while Selected and idle.
    pub linktest_interval: Duration,
}

impl Default for TimerConfig {
    fn default() -> TimerConfig {
        TimerConfig {
            t3: Duration::from_secs(45),
            t5: Duration::from_secs(10),
            t6: Duration::from_secs(5),
            t7: Duration::from_secs(10),
            t8: Duration::from_secs(5),
            linktest_interval: Duration::from_secs(60),
        }
    }
}

/// Waits on `fut`, mapping a timeout to `on_timeout`. Used to drive T3/T6/T7 uniformly: the
/// caller supplies the deadline and the specific error kind the spec names for that timer.
pub async fn with_deadline<F, T>(duration: Duration, fut: F, on_timeout: HsmsError) -> Result<T>
where
    F: std::future::Future<Output = T>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(v) => Ok(v),
        Err(_) => Err(on_timeout),
    }
}

/// Enforces T5 between active-role connect attempts. Returns `Err(T5Throttle)` if `now` is
/// less than `t5` after `last_attempt`.
pub fn check_t5(last_attempt: Option<Instant>, now: Instant, t5: Duration) -> Result<()> {
    match last_attempt {
        Some(last) if now.duration_since(last) < t5 => Err(HsmsError::T5Throttle),
        _ => Ok(()),
    }
}
