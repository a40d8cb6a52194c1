//! Bounded polling used in place of fixed settle delays.

use std::time::Duration;

/// Abstracts sleeping so escalation tests run instantly.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Check `interval` apart until the condition holds or `timeout` elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            timeout,
        }
    }

    /// Poll `done` until it returns true. Returns whether it did in time.
    ///
    /// The first check happens after one interval; the total time slept
    /// never exceeds `timeout` rounded up to a whole interval.
    pub fn wait_until(&self, sleeper: &impl Sleeper, mut done: impl FnMut() -> bool) -> bool {
        let mut waited = Duration::ZERO;
        loop {
            sleeper.sleep(self.interval);
            waited += self.interval;
            if done() {
                return true;
            }
            if waited >= self.timeout {
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorded(Mutex<Vec<Duration>>);

    impl Sleeper for Recorded {
        fn sleep(&self, d: Duration) {
            self.0.lock().expect("lock").push(d);
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn stops_as_soon_as_condition_holds() {
        let sleeper = Recorded::default();
        let mut checks = 0;
        let ok = PollPolicy::new(ms(100), ms(1000)).wait_until(&sleeper, || {
            checks += 1;
            checks == 3
        });
        assert!(ok);
        assert_eq!(sleeper.0.lock().expect("lock").len(), 3);
    }

    #[test]
    fn gives_up_at_timeout() {
        let sleeper = Recorded::default();
        let ok = PollPolicy::new(ms(100), ms(350)).wait_until(&sleeper, || false);
        assert!(!ok);
        let total: Duration = sleeper.0.lock().expect("lock").iter().sum();
        assert_eq!(total, ms(400));
    }

    #[test]
    fn zero_interval_is_bumped() {
        let policy = PollPolicy::new(Duration::ZERO, ms(2));
        assert_eq!(policy.interval, ms(1));
    }
}
