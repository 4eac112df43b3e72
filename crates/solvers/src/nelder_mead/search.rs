use iqcal_core::{Measure, Observer};

use super::{Action, Config, Error, Event, Move, Simplex, Solution, Status, Vertex};

/// Core Nelder–Mead implementation.
pub(super) fn search<M, Obs, const N: usize>(
    measure: &mut M,
    simplex: &Simplex<N>,
    config: &Config<N>,
    observer: Obs,
) -> Result<Solution<N>, Error<M::Error>>
where
    M: Measure<N>,
    Obs: for<'a> Observer<Event<'a, M, N>, Action>,
{
    let mut run = Run {
        measure,
        observer,
        config,
        evaluations: 0,
        iters: 0,
        best: None,
    };

    let status = match run.solve(simplex) {
        Ok(status) => status,
        Err(Halt::Stopped) => Status::StoppedByObserver,
        Err(Halt::Failed(error)) => return Err(Error::Measure(error)),
    };

    // At least one vertex is measured before any status is reached.
    let best = run.best.unwrap_or(Vertex::new(simplex.vertices()[0], f64::NAN));

    Ok(Solution {
        status,
        x: best.x,
        value: best.value,
        iters: run.iters,
        evaluations: run.evaluations,
    })
}

/// Why a run ended before reaching a status of its own.
enum Halt<E> {
    Stopped,
    Failed(E),
}

struct Run<'r, M, Obs, const N: usize> {
    measure: &'r mut M,
    observer: Obs,
    config: &'r Config<N>,
    evaluations: usize,
    iters: usize,
    best: Option<Vertex<N>>,
}

impl<M, Obs, const N: usize> Run<'_, M, Obs, N>
where
    M: Measure<N>,
    Obs: for<'a> Observer<Event<'a, M, N>, Action>,
{
    fn solve(&mut self, simplex: &Simplex<N>) -> Result<Status, Halt<M::Error>> {
        let mut sim = Vec::with_capacity(N + 1);
        for &x in simplex.vertices() {
            sim.push(self.eval(x)?);
        }
        sort(&mut sim);

        loop {
            if self.evaluations >= self.config.max_evals() {
                return Ok(Status::MaxEvals);
            }
            if self.iters >= self.config.max_iters() {
                return Ok(Status::MaxIters);
            }
            if converged(&sim, self.config) {
                return Ok(Status::Converged);
            }

            let step = self.update(&mut sim)?;
            self.iters += 1;
            sort(&mut sim);

            let event: Event<'_, M, N> = Event::Iterated {
                iter: self.iters,
                step,
                best: sim[0],
                diameter: diameter(&sim),
            };
            if let Some(Action::StopEarly) = self.observer.observe(&event) {
                return Err(Halt::Stopped);
            }
        }
    }

    /// Replaces the worst vertex of a sorted simplex, or shrinks it.
    fn update(&mut self, sim: &mut [Vertex<N>]) -> Result<Move, Halt<M::Error>> {
        let worst = sim[N];
        let centroid: [f64; N] = std::array::from_fn(|k| {
            sim[..N].iter().map(|vertex| vertex.x[k]).sum::<f64>() / N as f64
        });
        let along = |t: f64| -> [f64; N] {
            std::array::from_fn(|k| centroid[k] + t * (centroid[k] - worst.x[k]))
        };

        let reflected = self.eval(along(1.0))?;

        if reflected.value < sim[0].value {
            let expanded = self.eval(along(2.0))?;
            return Ok(if expanded.value < reflected.value {
                sim[N] = expanded;
                Move::Expand
            } else {
                sim[N] = reflected;
                Move::Reflect
            });
        }

        if reflected.value < sim[N - 1].value {
            sim[N] = reflected;
            return Ok(Move::Reflect);
        }

        if reflected.value < worst.value {
            let contracted = self.eval(along(0.5))?;
            if contracted.value <= reflected.value {
                sim[N] = contracted;
                return Ok(Move::ContractOutside);
            }
        } else {
            let contracted = self.eval(along(-0.5))?;
            if contracted.value < worst.value {
                sim[N] = contracted;
                return Ok(Move::ContractInside);
            }
        }

        let anchor = sim[0].x;
        for vertex in &mut sim[1..] {
            let x = std::array::from_fn(|k| anchor[k] + 0.5 * (vertex.x[k] - anchor[k]));
            *vertex = self.eval(x)?;
        }
        Ok(Move::Shrink)
    }

    /// Clips and measures `x`, tracking the best vertex.
    fn eval(&mut self, x: [f64; N]) -> Result<Vertex<N>, Halt<M::Error>> {
        let x = self.config.clip(x);

        let value = match self.measure.measure(x) {
            Ok(value) => value,
            Err(error) => {
                let event: Event<'_, M, N> = Event::MeasureFailed { x, error: &error };
                let _ = self.observer.observe(&event);
                return Err(Halt::Failed(error));
            }
        };
        self.evaluations += 1;

        let vertex = Vertex::new(x, value);
        let best = match self.best {
            Some(incumbent) if !improves(value, incumbent.value) => incumbent,
            _ => vertex,
        };
        self.best = Some(best);

        let event: Event<'_, M, N> = Event::Evaluated {
            x,
            value,
            best,
            evaluation: self.evaluations,
        };
        if let Some(Action::StopEarly) = self.observer.observe(&event) {
            return Err(Halt::Stopped);
        }

        Ok(vertex)
    }
}

/// Sorts vertices by value, best first. NaN sorts last and ties keep order.
fn sort<const N: usize>(sim: &mut [Vertex<N>]) {
    sim.sort_by(|a, b| {
        a.value
            .partial_cmp(&b.value)
            .unwrap_or_else(|| a.value.is_nan().cmp(&b.value.is_nan()))
    });
}

/// Largest per-axis distance from any vertex to the first.
fn diameter<const N: usize>(sim: &[Vertex<N>]) -> f64 {
    let best = sim[0].x;
    sim[1..]
        .iter()
        .flat_map(|vertex| (0..N).map(move |k| (vertex.x[k] - best[k]).abs()))
        .fold(0.0, f64::max)
}

fn converged<const N: usize>(sim: &[Vertex<N>], config: &Config<N>) -> bool {
    let best = sim[0].value;
    diameter(sim) <= config.x_abs_tol()
        && sim[1..]
            .iter()
            .all(|vertex| (vertex.value - best).abs() <= config.f_abs_tol())
}

/// Strict improvement; ties keep the incumbent and NaN never beats a number.
fn improves(candidate: f64, incumbent: f64) -> bool {
    candidate < incumbent || (incumbent.is_nan() && !candidate.is_nan())
}
