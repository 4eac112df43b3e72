/// Receives solver events and optionally returns a control action.
///
/// Solvers call [`observe`](Observer::observe) at well-defined points and act
/// on the returned action, if any. Returning `None` never changes the
/// solver's control flow, so loggers and plotters are pure side observers.
///
/// `()` is the no-op observer, and any `FnMut(&E) -> Option<A>` closure is an
/// observer.
pub trait Observer<E, A> {
    /// Handles an event and returns an optional action.
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Stop {
        Now,
    }

    fn run<O: Observer<u32, Stop>>(mut observer: O) -> Option<u32> {
        for event in 0..10 {
            if observer.observe(&event) == Some(Stop::Now) {
                return Some(event);
            }
        }
        None
    }

    #[test]
    fn unit_observer_never_acts() {
        assert_eq!(run(()), None);
    }

    #[test]
    fn closure_observer_can_stop() {
        let mut seen = 0;
        let stopped = run(|event: &u32| {
            seen += 1;
            (*event == 3).then_some(Stop::Now)
        });

        assert_eq!(stopped, Some(3));
        assert_eq!(seen, 4);
    }
}
