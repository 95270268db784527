use std::time::{Duration, Instant};

/// Fixed-pace character reveal for assistant messages.
///
/// The total length is passed in on every call because chunks may extend the
/// message while it is still being revealed.
#[derive(Debug, Clone)]
pub struct Typewriter {
    interval: Duration,
    revealed: usize,
    last_tick: Instant,
}

impl Typewriter {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            revealed: 0,
            last_tick: now,
        }
    }

    pub fn revealed(&self) -> usize {
        self.revealed
    }

    pub fn is_complete(&self, total: usize) -> bool {
        self.revealed >= total
    }

    /// Reveal every character that came due since the last tick.
    /// Returns true once the whole text is visible.
    pub fn advance(&mut self, now: Instant, total: usize) -> bool {
        if self.is_complete(total) {
            self.revealed = total;
            self.last_tick = now;
            return true;
        }
        if self.interval.is_zero() {
            self.finish(total);
            return true;
        }

        let elapsed = now.saturating_duration_since(self.last_tick);
        let due = (elapsed.as_nanos() / self.interval.as_nanos()) as usize;
        if due > 0 {
            self.revealed = (self.revealed + due).min(total);
            // Keep the remainder so the pace doesn't drift with the frame clock.
            self.last_tick += self.interval * due as u32;
        }
        self.is_complete(total)
    }

    pub fn finish(&mut self, total: usize) {
        self.revealed = total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(20);

    #[test]
    fn reveals_one_character_per_interval() {
        let start = Instant::now();
        let mut tw = Typewriter::new(TICK, start);

        assert!(!tw.advance(start + Duration::from_millis(10), 5));
        assert_eq!(tw.revealed(), 0);

        assert!(!tw.advance(start + Duration::from_millis(45), 5));
        assert_eq!(tw.revealed(), 2);

        // The 5ms remainder carries over to the next tick.
        assert!(!tw.advance(start + Duration::from_millis(60), 5));
        assert_eq!(tw.revealed(), 3);

        assert!(tw.advance(start + Duration::from_millis(500), 5));
        assert_eq!(tw.revealed(), 5);
    }

    #[test]
    fn growing_text_keeps_revealing() {
        let start = Instant::now();
        let mut tw = Typewriter::new(TICK, start);
        assert!(tw.advance(start + Duration::from_millis(100), 3));

        assert!(!tw.is_complete(6));
        assert!(!tw.advance(start + Duration::from_millis(120), 6));
        assert_eq!(tw.revealed(), 4);
    }

    #[test]
    fn zero_interval_reveals_immediately() {
        let start = Instant::now();
        let mut tw = Typewriter::new(Duration::ZERO, start);
        assert!(tw.advance(start, 42));
        assert_eq!(tw.revealed(), 42);
    }

    #[test]
    fn finish_forces_completion() {
        let start = Instant::now();
        let mut tw = Typewriter::new(TICK, start);
        tw.finish(7);
        assert!(tw.is_complete(7));
    }
}
