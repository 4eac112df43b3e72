use iqcal_core::OffsetDomain;

/// Evenly spaced candidates across a clamped scan window.
///
/// The window `[center - range/2, center + range/2]` has both ends clamped
/// into `[domain.min(), domain.upper()]` before it is subdivided, so every
/// candidate lies in the legal interval. The last candidate is exactly the
/// upper end of the window.
#[derive(Debug, Clone, Copy)]
pub(super) struct ScanWindow {
    lo: f64,
    hi: f64,
    points: usize,
}

impl ScanWindow {
    /// Creates the window for a scan around `center`.
    ///
    /// `points` must be at least 2, which the config guarantees.
    pub(super) fn around(center: f64, range: f64, points: usize, domain: &OffsetDomain) -> Self {
        let half = 0.5 * range;
        Self {
            lo: domain.clamp(center - half),
            hi: domain.clamp(center + half),
            points,
        }
    }

    /// Returns the `k`th candidate in scan order.
    pub(super) fn value(&self, k: usize) -> f64 {
        let last = self.points - 1;
        if k >= last {
            return self.hi;
        }
        #[allow(clippy::cast_precision_loss)]
        let fraction = k as f64 / last as f64;
        self.lo + (self.hi - self.lo) * fraction
    }

    /// Returns all candidates in scan order.
    pub(super) fn values(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.points).map(|k| self.value(k))
    }
}
