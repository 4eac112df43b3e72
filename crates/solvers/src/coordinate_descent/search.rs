use iqcal_core::{Measure, Observer, OffsetDomain, Sample};

use super::{
    Action, Axis, Config, Error, Event, Solution, scan::ScanWindow, solution::Status,
    state::State,
};

/// Core coordinate-descent implementation.
pub(super) fn search<M, Obs>(
    measure: &mut M,
    start: [f64; 2],
    config: &Config,
    mut observer: Obs,
) -> Result<Solution, Error<M::Error>>
where
    M: Measure<2>,
    Obs: for<'a> Observer<Event<'a, M>, Action>,
{
    check_start(start, config.domain())?;

    let mut state = State::new(start, config);

    loop {
        let range = state.range();

        for axis in [Axis::I, Axis::Q] {
            match scan(measure, &mut state, axis, config, &mut observer)? {
                ScanOutcome::Finished(best) => state.accept(axis, best),
                ScanOutcome::StopEarly(best) => {
                    state.accept(axis, best);
                    return Ok(state.into_solution(Status::StoppedByObserver));
                }
            }
        }

        state.finish_iteration();

        let event: Event<'_, M> = Event::IterationCompleted {
            iter: state.iters(),
            range,
            best: state.current(),
        };
        if let Some(Action::StopEarly) = observer.observe(&event) {
            return Ok(state.into_solution(Status::StoppedByObserver));
        }

        if let Some(status) = state.termination(config) {
            return Ok(state.into_solution(status));
        }
    }
}

/// Rejects a start point outside the domain. Start points are never clamped.
fn check_start<E>(start: [f64; 2], domain: &OffsetDomain) -> Result<(), Error<E>> {
    for (axis, value) in [(Axis::I, start[0]), (Axis::Q, start[1])] {
        if !domain.contains(value) {
            return Err(Error::StartOutOfDomain {
                axis,
                value,
                min: domain.min(),
                max: domain.max(),
            });
        }
    }
    Ok(())
}

// ============================================================================
// 1D scan helper
// ============================================================================

enum ScanOutcome {
    Finished(Sample),
    StopEarly(Sample),
}

/// Measures every candidate along `axis` and returns the first minimum.
fn scan<M, Obs>(
    measure: &mut M,
    state: &mut State,
    axis: Axis,
    config: &Config,
    observer: &mut Obs,
) -> Result<ScanOutcome, Error<M::Error>>
where
    M: Measure<2>,
    Obs: for<'a> Observer<Event<'a, M>, Action>,
{
    let center = match axis {
        Axis::I => state.i(),
        Axis::Q => state.q(),
    };
    let window = ScanWindow::around(
        center,
        state.range(),
        config.points_per_scan(),
        config.domain(),
    );

    let mut best: Option<Sample> = None;

    for value in window.values() {
        let (i, q) = match axis {
            Axis::I => (value, state.q()),
            Axis::Q => (state.i(), value),
        };

        let power = match measure.measure([i, q]) {
            Ok(power) => power,
            Err(error) => {
                let event: Event<'_, M> = Event::MeasureFailed {
                    axis,
                    i,
                    q,
                    error: &error,
                };
                let _ = observer.observe(&event);
                return Err(Error::Measure(error));
            }
        };

        let sample = Sample::new(i, q, power);
        let scan_best = match best {
            Some(incumbent) if !improves(power, incumbent.power) => incumbent,
            _ => sample,
        };
        best = Some(scan_best);

        let event: Event<'_, M> = Event::Measured {
            axis,
            sample,
            best: scan_best,
            evaluation: state.count_evaluation(),
        };
        if let Some(Action::StopEarly) = observer.observe(&event) {
            return Ok(ScanOutcome::StopEarly(scan_best));
        }
    }

    Ok(ScanOutcome::Finished(best.unwrap_or_else(|| state.current())))
}

/// Strict improvement; ties keep the incumbent and NaN never beats a number.
fn improves(candidate: f64, incumbent: f64) -> bool {
    candidate < incumbent || (incumbent.is_nan() && !candidate.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_do_not_improve() {
        assert!(!improves(1.0, 1.0));
        assert!(improves(0.5, 1.0));
    }

    #[test]
    fn nan_never_wins() {
        assert!(!improves(f64::NAN, 1.0));
        assert!(improves(1.0, f64::NAN));
        assert!(!improves(f64::NAN, f64::NAN));
    }
}
