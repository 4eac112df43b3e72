use iqcal_core::Sample;

use super::{Axis, Config, Solution, Status};

/// Search state owned by a single call to `minimize`.
pub(super) struct State {
    i: f64,
    q: f64,
    range: f64,
    power: f64,
    iters: usize,
    evaluations: usize,
}

impl State {
    pub(super) fn new(start: [f64; 2], config: &Config) -> Self {
        Self {
            i: start[0],
            q: start[1],
            range: config.initial_range(),
            power: f64::NAN,
            iters: 0,
            evaluations: 0,
        }
    }

    pub(super) fn i(&self) -> f64 {
        self.i
    }

    pub(super) fn q(&self) -> f64 {
        self.q
    }

    pub(super) fn range(&self) -> f64 {
        self.range
    }

    pub(super) fn iters(&self) -> usize {
        self.iters
    }

    /// Counts one measurement and returns the running total.
    pub(super) fn count_evaluation(&mut self) -> usize {
        self.evaluations += 1;
        self.evaluations
    }

    /// Moves the estimate along `axis` to the best point of a scan.
    pub(super) fn accept(&mut self, axis: Axis, best: Sample) {
        match axis {
            Axis::I => self.i = best.i,
            Axis::Q => self.q = best.q,
        }
        self.power = best.power;
    }

    pub(super) fn current(&self) -> Sample {
        Sample::new(self.i, self.q, self.power)
    }

    /// Halves the window and records a completed iteration.
    pub(super) fn finish_iteration(&mut self) {
        self.range *= 0.5;
        self.iters += 1;
    }

    /// Returns the stopping status, or `None` if the search should continue.
    pub(super) fn termination(&self, config: &Config) -> Option<Status> {
        if self.power <= config.stop_threshold() {
            Some(Status::Converged)
        } else if self.range < config.min_range() {
            Some(Status::RangeFloor)
        } else {
            None
        }
    }

    pub(super) fn into_solution(self, status: Status) -> Solution {
        Solution {
            status,
            i: self.i,
            q: self.q,
            power: self.power,
            iters: self.iters,
            evaluations: self.evaluations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminates_on_threshold_before_range_floor() {
        let config = Config::new(1.0, 4, -50.0, 0.75).unwrap();
        let mut state = State::new([0.0, 0.0], &config);

        state.accept(Axis::Q, Sample::new(0.0, 0.1, -60.0));
        state.finish_iteration();

        assert_eq!(state.termination(&config), Some(Status::Converged));
    }

    #[test]
    fn terminates_on_range_floor() {
        let config = Config::new(1.0, 4, -50.0, 0.75).unwrap();
        let mut state = State::new([0.0, 0.0], &config);

        state.accept(Axis::Q, Sample::new(0.0, 0.1, -40.0));
        state.finish_iteration();

        assert_eq!(state.termination(&config), Some(Status::RangeFloor));
    }

    #[test]
    fn continues_while_above_threshold_and_floor() {
        let config = Config::new(1.0, 4, -50.0, 0.25).unwrap();
        let mut state = State::new([0.0, 0.0], &config);

        state.accept(Axis::Q, Sample::new(0.0, 0.1, -40.0));
        state.finish_iteration();

        assert_eq!(state.termination(&config), None);
        assert_eq!(state.iters(), 1);
    }
}
