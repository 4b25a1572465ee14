use std::thread;
use std::time::{Duration, Instant};

/// Paces a dedicated loop thread at a fixed rate. Deadline-based: each
/// `wait` sleeps until the next slot, and a stall longer than a few
/// periods realigns to now instead of bursting to catch up.
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    pub fn from_rate(rate: u32) -> Self {
        let period = Duration::from_secs_f64(1.0 / rate.max(1) as f64);
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn dt(&self) -> f32 {
        self.period.as_secs_f32()
    }

    pub fn wait(&mut self) {
        let now = Instant::now();
        if now < self.next {
            thread::sleep(self.next - now);
        } else if now > self.next + self.period * 4 {
            self.next = now;
        }
        self.next += self.period;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_sets_period() {
        let ticker = Ticker::from_rate(50);
        assert_eq!(ticker.period().as_millis(), 20);
        assert!((ticker.dt() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn wait_paces_the_loop() {
        let mut ticker = Ticker::from_rate(100);

        let start = Instant::now();
        for _ in 0..5 {
            ticker.wait();
        }

        // Sleeps are at-least; five slots at 10 ms each.
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[test]
    fn stall_realigns_without_burst() {
        let mut ticker = Ticker::from_rate(100);

        thread::sleep(Duration::from_millis(80));
        ticker.wait();

        let start = Instant::now();
        for _ in 0..3 {
            ticker.wait();
        }

        // A burst would run all three immediately.
        assert!(start.elapsed() >= Duration::from_millis(25));
    }
}
