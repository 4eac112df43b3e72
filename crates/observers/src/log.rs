use iqcal_core::{Measure, Observer};
use iqcal_solvers::{coordinate_descent, nelder_mead};
use tracing::{debug, info, warn};

/// An observer that reports solver progress through `tracing`.
///
/// Completed iterations are logged at `info`, individual measurements at
/// `debug`, and failed measurements at `warn`. It never returns an action,
/// so a logged run takes the same path as an unobserved one.
///
/// # Example
///
/// ```ignore
/// let solution = coordinate_descent::minimize(&mut measure, start, &config, LogObserver)?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl<M: Measure<2>> Observer<coordinate_descent::Event<'_, M>, coordinate_descent::Action>
    for LogObserver
{
    fn observe(
        &mut self,
        event: &coordinate_descent::Event<'_, M>,
    ) -> Option<coordinate_descent::Action> {
        match event {
            coordinate_descent::Event::Measured {
                axis,
                sample,
                evaluation,
                ..
            } => debug!(
                %axis,
                i = sample.i,
                q = sample.q,
                power = sample.power,
                evaluation,
                "measured"
            ),
            coordinate_descent::Event::MeasureFailed { axis, i, q, error } => {
                warn!(%axis, i, q, error = %error, "measurement failed");
            }
            coordinate_descent::Event::IterationCompleted { iter, range, best } => info!(
                iter,
                range,
                i = best.i,
                q = best.q,
                power = best.power,
                "coordinate descent iteration"
            ),
        }
        None
    }
}

impl<M: Measure<N>, const N: usize> Observer<nelder_mead::Event<'_, M, N>, nelder_mead::Action>
    for LogObserver
{
    fn observe(&mut self, event: &nelder_mead::Event<'_, M, N>) -> Option<nelder_mead::Action> {
        match event {
            nelder_mead::Event::Evaluated {
                x,
                value,
                evaluation,
                ..
            } => debug!(x = ?x, value, evaluation, "measured"),
            nelder_mead::Event::MeasureFailed { x, error } => {
                warn!(x = ?x, error = %error, "measurement failed");
            }
            nelder_mead::Event::Iterated {
                iter,
                step,
                best,
                diameter,
            } => info!(
                iter,
                step = ?step,
                x = ?best.x,
                value = best.value,
                diameter,
                "nelder-mead iteration"
            ),
        }
        None
    }
}
