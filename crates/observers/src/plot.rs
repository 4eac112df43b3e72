//! Scan plots in a native egui window.

use eframe::egui;
use egui_plot::{HLine, Legend, Line, Plot, PlotPoints, Points};
use iqcal_core::{Measure, Observer};
use iqcal_solvers::{coordinate_descent, nelder_mead};

/// How recorded readings are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceStyle {
    /// Consecutive readings joined by a line.
    #[default]
    Lines,

    /// Unconnected markers. Overlapping coordinate-descent windows read better this way.
    Markers,
}

/// Window settings for [`PlotObserver::show`].
///
/// ```ignore
/// plot.show(PlotWindow::new("LO leakage").x_label("offset").threshold(-90.0))?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PlotWindow {
    title: String,
    x_label: String,
    y_label: String,
    style: TraceStyle,
    threshold: Option<f64>,
}

impl PlotWindow {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: String::new(),
            y_label: "power [dBm]".to_owned(),
            style: TraceStyle::default(),
            threshold: None,
        }
    }

    #[must_use]
    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = label.into();
        self
    }

    #[must_use]
    pub fn y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = label.into();
        self
    }

    #[must_use]
    pub fn style(mut self, style: TraceStyle) -> Self {
        self.style = style;
        self
    }

    /// Draws a horizontal reference line, typically the stop threshold.
    #[must_use]
    pub fn threshold(mut self, power: f64) -> Self {
        self.threshold = Some(power);
        self
    }
}

/// A solver event that contributes one abscissa and up to `N` readings.
///
/// Coordinate-descent events plot power against the scanned offset, I scans
/// in trace 0 and Q scans in trace 1. Nelder–Mead events plot each reading
/// and the running best against the evaluation index.
pub trait Plottable<const N: usize> {
    /// `None` skips the event. A `None` slot skips that trace.
    fn plot_point(&self) -> Option<(f64, [Option<f64>; N])>;
}

impl<M: Measure<2>> Plottable<2> for coordinate_descent::Event<'_, M> {
    fn plot_point(&self) -> Option<(f64, [Option<f64>; 2])> {
        let coordinate_descent::Event::Measured { axis, sample, .. } = self else {
            return None;
        };
        Some(match axis {
            coordinate_descent::Axis::I => (sample.i, [Some(sample.power), None]),
            coordinate_descent::Axis::Q => (sample.q, [None, Some(sample.power)]),
        })
    }
}

impl<M: Measure<N>, const N: usize> Plottable<2> for nelder_mead::Event<'_, M, N> {
    fn plot_point(&self) -> Option<(f64, [Option<f64>; 2])> {
        let nelder_mead::Event::Evaluated {
            value,
            best,
            evaluation,
            ..
        } = self
        else {
            return None;
        };
        Some((*evaluation as f64, [Some(*value), Some(best.value)]))
    }
}

#[derive(Debug, Clone, Default)]
struct Trace {
    name: String,
    points: Vec<[f64; 2]>,
}

/// Collects readings during a search for display afterward.
///
/// Pass `&mut PlotObserver` to the solver so the observer is still owned when
/// the search returns:
///
/// ```ignore
/// let mut plot = PlotObserver::new(["I scan", "Q scan"]);
/// coordinate_descent::minimize(&mut measure, start, &config, &mut plot)?;
/// plot.show(PlotWindow::new("LO leakage").style(TraceStyle::Markers))?;
/// ```
#[derive(Debug, Clone)]
pub struct PlotObserver<const N: usize> {
    traces: [Trace; N],
}

impl<const N: usize> PlotObserver<N> {
    #[must_use]
    pub fn new(names: [&str; N]) -> Self {
        Self {
            traces: names.map(|name| Trace {
                name: name.to_owned(),
                points: Vec::new(),
            }),
        }
    }

    /// Appends `x` against every present, finite reading.
    pub fn record(&mut self, x: f64, readings: [Option<f64>; N]) {
        for (trace, y) in self.traces.iter_mut().zip(readings) {
            if let Some(y) = y.filter(|y| y.is_finite()) {
                trace.points.push([x, y]);
            }
        }
    }

    /// Points recorded so far, per trace.
    #[must_use]
    pub fn len(&self) -> [usize; N] {
        self.traces.each_ref().map(|trace| trace.points.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.traces.iter().all(|trace| trace.points.is_empty())
    }

    /// Opens the window and blocks until it is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if no native window can be created.
    pub fn show(self, window: PlotWindow) -> Result<(), eframe::Error> {
        let title = window.title.clone();
        let app = ScanPlot {
            traces: self.traces.into(),
            window,
        };
        eframe::run_native(
            &title,
            eframe::NativeOptions::default(),
            Box::new(move |_cc| Ok(Box::new(app))),
        )
    }
}

impl<const N: usize, E: Plottable<N>, A> Observer<E, A> for PlotObserver<N> {
    fn observe(&mut self, event: &E) -> Option<A> {
        if let Some((x, readings)) = event.plot_point() {
            self.record(x, readings);
        }
        None
    }
}

impl<const N: usize, E: Plottable<N>, A> Observer<E, A> for &mut PlotObserver<N> {
    fn observe(&mut self, event: &E) -> Option<A> {
        (**self).observe(event)
    }
}

struct ScanPlot {
    traces: Vec<Trace>,
    window: PlotWindow,
}

impl eframe::App for ScanPlot {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let window = &self.window;
        egui::CentralPanel::default().show(ctx, |ui| {
            Plot::new("scan")
                .x_axis_label(window.x_label.clone())
                .y_axis_label(window.y_label.clone())
                .legend(Legend::default())
                .show(ui, |plot_ui| {
                    for trace in &self.traces {
                        let points: PlotPoints = trace.points.iter().copied().collect();
                        match window.style {
                            TraceStyle::Lines => {
                                plot_ui.line(Line::new(points).name(&trace.name));
                            }
                            TraceStyle::Markers => {
                                plot_ui.points(Points::new(points).radius(2.0).name(&trace.name));
                            }
                        }
                    }
                    if let Some(power) = window.threshold {
                        plot_ui.hline(HLine::new(power).name("threshold"));
                    }
                });
        });
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use approx::assert_relative_eq;
    use iqcal_solvers::{coordinate_descent as cd, nelder_mead as nm};

    use super::*;

    fn bowl([i, q]: [f64; 2]) -> Result<f64, Infallible> {
        Ok((i - 0.2).powi(2) + (q + 0.1).powi(2))
    }

    fn points<const N: usize>(plot: &PlotObserver<N>, trace: usize) -> &[[f64; 2]] {
        &plot.traces[trace].points
    }

    #[test]
    fn coordinate_descent_scans_split_by_axis() {
        let config = cd::Config::new(0.8, 5, -90.0, 0.5).unwrap();
        let mut plot = PlotObserver::new(["I scan", "Q scan"]);
        let mut measure = bowl;

        let solution = cd::minimize(&mut measure, [0.0, 0.0], &config, &mut plot).unwrap();

        assert_eq!(solution.iters, 1);
        assert_eq!(plot.len(), [5, 5]);
        // The I scan sweeps i with q held at the start.
        let [i, power] = points(&plot, 0)[0];
        assert_relative_eq!(i, -0.4);
        assert_relative_eq!(power, 0.37, epsilon = 1e-12);
        assert!(points(&plot, 1).iter().all(|p| (-0.4..=0.4).contains(&p[0])));
    }

    #[test]
    fn nelder_mead_best_never_rises() {
        let simplex = nm::Simplex::axis_aligned([0.0, 0.0], [0.05, 0.05]).unwrap();
        let config = nm::Config::new(1e-4, 1e-4, 3, 100).unwrap();
        let mut plot = PlotObserver::new(["reading", "best"]);
        let mut measure = bowl;

        let solution = nm::minimize(&mut measure, &simplex, &config, &mut plot).unwrap();

        assert_eq!(plot.len(), [solution.evaluations; 2]);
        let xs: Vec<f64> = points(&plot, 0).iter().map(|p| p[0]).collect();
        assert_eq!(xs[..3], [1.0, 2.0, 3.0]);
        assert!(points(&plot, 1).windows(2).all(|w| w[1][1] <= w[0][1]));
    }

    #[test]
    fn record_drops_missing_and_non_finite_readings() {
        let mut plot = PlotObserver::new(["a", "b"]);
        plot.record(1.0, [Some(10.0), None]);
        plot.record(2.0, [None, Some(20.0)]);
        plot.record(3.0, [Some(f64::NAN), Some(f64::NEG_INFINITY)]);

        assert_eq!(points(&plot, 0), [[1.0, 10.0]]);
        assert_eq!(points(&plot, 1), [[2.0, 20.0]]);
    }

    #[test]
    fn plotting_leaves_the_search_unchanged() {
        let config = cd::Config::new(0.8, 4, -90.0, 0.5).unwrap();
        let mut plot = PlotObserver::new(["I scan", "Q scan"]);
        let mut actions = 0;

        let mut measure = bowl;
        let plotted = cd::minimize(&mut measure, [0.0, 0.0], &config, |event: &cd::Event<'_, _>| {
            let action: Option<cd::Action> = plot.observe(event);
            actions += usize::from(action.is_some());
            None
        })
        .unwrap();
        let plain = cd::minimize_unobserved(&mut measure, [0.0, 0.0], &config).unwrap();

        assert_eq!(actions, 0);
        assert_eq!(plotted, plain);
        assert!(!plot.is_empty());
    }

    #[test]
    fn window_defaults_to_power_lines() {
        let window = PlotWindow::new("LO leakage").threshold(-90.0);

        assert_eq!(window.y_label, "power [dBm]");
        assert_eq!(window.style, TraceStyle::Lines);
        assert_eq!(window.threshold, Some(-90.0));
    }
}
