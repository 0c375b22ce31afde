//! Per-connection action rate limiting.
//!
//! Socket.IO rate limiting in the teacher's stack went through Redis
//! sliding-window counters so limits held across instances. This server owns
//! every game in a single process, so an in-memory token bucket per
//! connection (via `governor`) is the idiomatic replacement — no shared state
//! to keep consistent, no Redis round trip on every action.

use std::num::NonZeroU32;

use governor::{Quota, RateLimiter};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};

pub type ActionLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// One session's actions: generous enough for legitimate play (a player
/// answers, qualifies, and assesses at most once per round) while blocking a
/// client stuck in a retry loop.
pub fn session_action_limiter() -> ActionLimiter {
    let quota = Quota::per_second(NonZeroU32::new(5).unwrap()).allow_burst(NonZeroU32::new(10).unwrap());
    RateLimiter::direct(quota)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_is_exhausted_before_steady_rate_kicks_in() {
        let limiter = session_action_limiter();
        let mut allowed = 0;
        for _ in 0..20 {
            if limiter.check().is_ok() {
                allowed += 1;
            }
        }
        assert!(allowed >= 10 && allowed < 20);
    }
}
