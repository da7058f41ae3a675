//! Fixed-window moving-average smoothing for sensor streams

use std::collections::VecDeque;

/// Running average over the most recent `limit` samples.
///
/// During warm-up (fewer samples than the window) the divisor is the number
/// of samples seen so far, not the window size. Averages use floor division,
/// matching the integer Celsius readings they smooth.
#[derive(Debug)]
pub struct MovingAverage {
    limit: usize,
    queue: VecDeque<i64>,
    total: i64,
}

impl MovingAverage {
    /// Create a smoother with the given window size.
    ///
    /// A window of 0 is treated as 1 (every push returns the pushed value).
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            queue: VecDeque::new(),
            total: 0,
        }
    }

    /// Push a sample and return the current average.
    pub fn push(&mut self, value: i64) -> i64 {
        self.queue.push_back(value);
        self.total += value;

        if self.queue.len() > self.limit {
            // VecDeque is non-empty here
            let removed = self.queue.pop_front().unwrap_or(0);
            self.total -= removed;
        }

        self.total.div_euclid(self.queue.len() as i64)
    }

    /// Number of samples currently in the window.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if no samples have been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_of_two() {
        let mut avg = MovingAverage::new(2);
        assert_eq!(avg.push(10), 10);
        assert_eq!(avg.push(20), 15);
        assert_eq!(avg.push(30), 25);
    }

    #[test]
    fn test_identical_values_return_the_value() {
        for window in [1, 3, 6] {
            let mut avg = MovingAverage::new(window);
            for _ in 0..10 {
                assert_eq!(avg.push(42), 42);
            }
        }
    }

    #[test]
    fn test_warmup_divides_by_samples_seen() {
        let mut avg = MovingAverage::new(5);
        assert_eq!(avg.push(10), 10);
        assert_eq!(avg.push(20), 15); // (10+20)/2, not /5
        assert_eq!(avg.push(30), 20); // (10+20+30)/3
    }

    #[test]
    fn test_eviction_beyond_window() {
        let mut avg = MovingAverage::new(3);
        avg.push(10);
        avg.push(20);
        avg.push(30);
        // 10 falls out of the window
        assert_eq!(avg.push(40), 30); // (20+30+40)/3
        assert_eq!(avg.len(), 3);
    }

    #[test]
    fn test_floor_division() {
        let mut avg = MovingAverage::new(2);
        avg.push(10);
        assert_eq!(avg.push(15), 12); // floor(25/2)
    }

    #[test]
    fn test_floor_division_negative_sums() {
        // Floor semantics (toward negative infinity), not truncation.
        let mut avg = MovingAverage::new(2);
        avg.push(-10);
        assert_eq!(avg.push(-15), -13); // floor(-25/2) = -13
    }

    #[test]
    fn test_zero_window_behaves_as_one() {
        let mut avg = MovingAverage::new(0);
        assert_eq!(avg.push(10), 10);
        assert_eq!(avg.push(99), 99);
        assert_eq!(avg.len(), 1);
    }

    #[test]
    fn test_window_of_one_tracks_latest() {
        let mut avg = MovingAverage::new(1);
        assert_eq!(avg.push(60), 60);
        assert_eq!(avg.push(10), 10);
        assert_eq!(avg.push(85), 85);
    }
}
