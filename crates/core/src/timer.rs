/// What a countdown does on one elapsed second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// Still running with this many seconds left.
    Tick(u32),
    /// Reached zero. Emitted exactly once.
    Expired,
    /// Already expired; nothing more to report.
    Finished,
}

/// Pure per-question countdown arithmetic.
///
/// The async driver in `services` calls [`Countdown::step`] once per second
/// and forwards the result; keeping the counting here makes it testable
/// without a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    expired: bool,
}

impl Countdown {
    #[must_use]
    pub fn new(seconds: u32) -> Self {
        Self {
            remaining: seconds,
            expired: false,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Account for one elapsed second.
    ///
    /// A countdown started at zero expires on its first step.
    pub fn step(&mut self) -> CountdownStep {
        if self.expired {
            return CountdownStep::Finished;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expired = true;
            CountdownStep::Expired
        } else {
            CountdownStep::Tick(self.remaining)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_down_then_expires_once() {
        let mut countdown = Countdown::new(3);
        assert_eq!(countdown.step(), CountdownStep::Tick(2));
        assert_eq!(countdown.step(), CountdownStep::Tick(1));
        assert_eq!(countdown.step(), CountdownStep::Expired);
        assert_eq!(countdown.step(), CountdownStep::Finished);
        assert_eq!(countdown.step(), CountdownStep::Finished);
        assert!(countdown.is_expired());
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn zero_start_expires_immediately() {
        let mut countdown = Countdown::new(0);
        assert_eq!(countdown.step(), CountdownStep::Expired);
        assert_eq!(countdown.step(), CountdownStep::Finished);
    }
}
