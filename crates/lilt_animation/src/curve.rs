//! Sampled curves
//!
//! A [`SampledCurve`] is an ordered list of `(time, value)` control points in
//! normalized units: time runs from exactly 0 to exactly 1, values are
//! progress fractions (usually 0 to 1, but custom curves may overshoot).
//! Curves come either from fixed-step sampling of a built-in
//! [`EasingKind`] or directly from the caller.
//!
//! A [`MaterializedCurve`] is a normalized curve rescaled onto one
//! component of a running tween: its times are seconds and its values are
//! real component values. Materialized curves own their key buffer, so a
//! pooled tween re-materializes without allocating.

use serde::{Deserialize, Serialize};

use crate::easing::{progress, EasingKind, Progress};

/// Snap distance for first/last key times that are meant to be 0 and 1
const ANCHOR_EPSILON: f32 = 1e-5;

/// Local scan length before falling back to a binary search
const MAX_SCAN_OFFSET: usize = 2;

/// Default sampling resolution for [`SampledCurve::from_easing`]
pub const DEFAULT_CURVE_STEPS: usize = 32;

/// A single control point
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

impl CurveKey {
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// Remembers the last segment used, so monotonically advancing samples are O(1)
#[derive(Clone, Copy, Debug, Default)]
pub struct CurveCursor {
    last_index: usize,
}

impl CurveCursor {
    pub fn reset(&mut self) {
        self.last_index = 0;
    }
}

/// A normalized `(time, value)` curve
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampledCurve {
    keys: Vec<CurveKey>,
}

impl Default for SampledCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl SampledCurve {
    /// The fallback curve: a straight line from (0, 0) to (1, 1)
    pub fn linear() -> Self {
        Self {
            keys: vec![CurveKey::new(0.0, 0.0), CurveKey::new(1.0, 1.0)],
        }
    }

    /// Build a curve from caller-supplied keys
    ///
    /// The keys are kept as given; call [`normalized`](Self::normalized)
    /// (tweens do this automatically) to sort and validate them.
    pub fn from_keys(keys: impl IntoIterator<Item = CurveKey>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Build a curve from `(time, value)` pairs
    pub fn from_points(points: &[(f32, f32)]) -> Self {
        Self::from_keys(points.iter().map(|&(time, value)| CurveKey::new(time, value)))
    }

    /// Sample a built-in easing curve at `steps` equal time steps
    ///
    /// Produces `steps + 1` keys; `steps` is raised to at least 1.
    pub fn from_easing(kind: EasingKind, steps: usize) -> Self {
        let steps = steps.max(1);
        let keys = (0..=steps).map(|i| {
            if i == steps {
                return CurveKey::new(1.0, 1.0);
            }
            let t = i as f32 / steps as f32;
            CurveKey::new(t, kind.apply(t))
        });
        Self::from_keys(keys)
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Check the curve invariants without modifying it
    ///
    /// Well-formed curves have at least two finite keys, non-decreasing
    /// times, the first key at time 0 and the last at time 1.
    pub fn is_well_formed(&self) -> bool {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return false;
        };
        self.keys.len() >= 2
            && self.keys.iter().all(|k| k.time.is_finite() && k.value.is_finite())
            && self.keys.windows(2).all(|w| w[0].time <= w[1].time)
            && first.time == 0.0
            && last.time == 1.0
    }

    /// Sort and validate in place
    ///
    /// Returns `false` when the curve was malformed and has been replaced
    /// by the linear fallback.
    pub fn normalize(&mut self) -> bool {
        if self.keys.len() < 2
            || self
                .keys
                .iter()
                .any(|k| !k.time.is_finite() || !k.value.is_finite())
        {
            self.reset_linear();
            return false;
        }

        self.keys.sort_by(|a, b| a.time.total_cmp(&b.time));

        let last = self.keys.len() - 1;
        let anchored = self.keys[0].time.abs() <= ANCHOR_EPSILON
            && (self.keys[last].time - 1.0).abs() <= ANCHOR_EPSILON;
        if !anchored {
            self.reset_linear();
            return false;
        }

        self.keys[0].time = 0.0;
        self.keys[last].time = 1.0;
        true
    }

    /// Consuming form of [`normalize`](Self::normalize)
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Sample the curve at normalized time `t` (clamped to 0.0..=1.0)
    pub fn sample(&self, t: f32) -> f32 {
        let mut cursor = CurveCursor::default();
        self.sample_with_cursor(t, &mut cursor)
    }

    /// Sample using a cursor; cheap when `t` advances between calls
    pub fn sample_with_cursor(&self, t: f32, cursor: &mut CurveCursor) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        interpolate(&self.keys, t, cursor)
    }

    /// Overwrite this curve with `other`, reusing the key buffer
    pub(crate) fn copy_from(&mut self, other: &SampledCurve) {
        self.keys.clear();
        self.keys.extend_from_slice(&other.keys);
    }

    fn reset_linear(&mut self) {
        self.keys.clear();
        self.keys
            .extend_from_slice(&[CurveKey::new(0.0, 0.0), CurveKey::new(1.0, 1.0)]);
    }
}

/// A normalized curve rescaled onto one component's real range and duration
#[derive(Clone, Debug, Default)]
pub struct MaterializedCurve {
    keys: Vec<CurveKey>,
    cursor: CurveCursor,
    duration: f32,
}

impl MaterializedCurve {
    /// Rescale `curve` so time spans `[0, duration]` and values span `[start, end]`
    ///
    /// `curve` is expected to be normalized.
    pub fn materialize(&mut self, curve: &SampledCurve, start: f32, end: f32, duration: f32) {
        let delta = end - start;
        self.keys.clear();
        self.keys.extend(
            curve
                .keys()
                .iter()
                .map(|k| CurveKey::new(k.time * duration, start + delta * k.value)),
        );
        self.cursor.reset();
        self.duration = duration;
    }

    /// Value after `elapsed` seconds
    pub fn evaluate(&mut self, elapsed: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        match progress(elapsed, self.duration) {
            Progress::Start => first.value,
            Progress::End => last.value,
            Progress::Between(_) => interpolate(&self.keys, elapsed, &mut self.cursor),
        }
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Drop the keys but keep the allocation
    pub(crate) fn clear(&mut self) {
        self.keys.clear();
        self.cursor.reset();
        self.duration = 0.0;
    }
}

/// Piecewise-linear interpolation over keys sorted by time
fn interpolate(keys: &[CurveKey], time: f32, cursor: &mut CurveCursor) -> f32 {
    let len = keys.len();
    match len {
        0 => return 0.0,
        1 => return keys[0].value,
        _ => {}
    }
    if time <= keys[0].time {
        cursor.last_index = 0;
        return keys[0].value;
    }
    if time >= keys[len - 1].time {
        cursor.last_index = len - 2;
        return keys[len - 1].value;
    }

    let index = find_segment(keys, time, cursor);
    let a = keys[index];
    let b = keys[index + 1];
    let span = b.time - a.time;
    if span <= f32::EPSILON {
        return b.value;
    }
    let local = ((time - a.time) / span).clamp(0.0, 1.0);
    a.value + (b.value - a.value) * local
}

/// Index `i` such that `keys[i].time <= time < keys[i + 1].time`
///
/// Caller guarantees `keys[0].time < time < keys[len - 1].time`.
fn find_segment(keys: &[CurveKey], time: f32, cursor: &mut CurveCursor) -> usize {
    let last_segment = keys.len() - 2;
    let start = cursor.last_index.min(last_segment);

    if keys[start].time <= time {
        for index in start..=(start + MAX_SCAN_OFFSET).min(last_segment) {
            if time < keys[index + 1].time {
                cursor.last_index = index;
                return index;
            }
        }
    }

    // Large jump or backwards seek
    let next = keys.partition_point(|k| k.time <= time);
    let index = next.saturating_sub(1).min(last_segment);
    cursor.last_index = index;
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_default() {
        let curve = SampledCurve::default();
        assert!(curve.is_well_formed());
        assert!((curve.sample(0.25) - 0.25).abs() < 1e-6);
        assert_eq!(curve.sample(-1.0), 0.0);
        assert_eq!(curve.sample(2.0), 1.0);
    }

    #[test]
    fn test_malformed_curves_fall_back_to_linear() {
        let cases = [
            SampledCurve::from_points(&[]),
            SampledCurve::from_points(&[(0.0, 0.0)]),
            SampledCurve::from_points(&[(0.1, 0.0), (1.0, 1.0)]),
            SampledCurve::from_points(&[(0.0, 0.0), (0.8, 1.0)]),
            SampledCurve::from_points(&[(0.0, f32::NAN), (1.0, 1.0)]),
        ];
        for mut curve in cases {
            assert!(!curve.normalize());
            assert_eq!(curve, SampledCurve::linear());
        }
    }

    #[test]
    fn test_normalize_sorts_and_snaps_anchors() {
        let mut curve =
            SampledCurve::from_points(&[(1.000_001, 1.0), (0.5, 2.0), (0.000_001, 0.0)]);
        assert!(!curve.is_well_formed());
        assert!(curve.normalize());
        assert!(curve.is_well_formed());
        assert_eq!(curve.keys()[0].time, 0.0);
        assert_eq!(curve.keys()[2].time, 1.0);
        // Custom values are not clamped
        assert_eq!(curve.sample(0.5), 2.0);
    }

    #[test]
    fn test_from_easing_sampling() {
        let curve = SampledCurve::from_easing(EasingKind::CubicIn, 4);
        assert_eq!(curve.len(), 5);
        assert!(curve.is_well_formed());
        assert!((curve.keys()[2].value - 0.125).abs() < 1e-6);
        assert_eq!(curve.keys()[4], CurveKey::new(1.0, 1.0));

        let coarse = SampledCurve::from_easing(EasingKind::Linear, 0);
        assert_eq!(coarse.len(), 2);
    }

    #[test]
    fn test_sampled_easing_approximates_formula() {
        let curve = SampledCurve::from_easing(EasingKind::QuinticOut, DEFAULT_CURVE_STEPS);
        for i in 0..=50 {
            let t = i as f32 / 50.0;
            assert!((curve.sample(t) - EasingKind::QuinticOut.apply(t)).abs() < 0.02);
        }
    }

    #[test]
    fn test_cursor_forward_and_backward() {
        let curve = SampledCurve::from_easing(EasingKind::Linear, 10);
        let mut cursor = CurveCursor::default();

        for i in 0..=100 {
            let t = i as f32 / 100.0;
            assert!((curve.sample_with_cursor(t, &mut cursor) - t).abs() < 1e-5);
        }
        // Jump back to the start
        assert!((curve.sample_with_cursor(0.05, &mut cursor) - 0.05).abs() < 1e-5);
        assert_eq!(cursor.last_index, 0);
    }

    #[test]
    fn test_materialize_rescales() {
        let curve = SampledCurve::from_points(&[(0.0, 0.0), (0.5, 0.8), (1.0, 1.0)]);
        let mut m = MaterializedCurve::default();
        m.materialize(&curve, 10.0, 20.0, 2.0);

        assert_eq!(m.keys()[1], CurveKey::new(1.0, 18.0));
        assert_eq!(m.evaluate(0.0), 10.0);
        assert!((m.evaluate(0.5) - 14.0).abs() < 1e-5);
        assert!((m.evaluate(1.5) - 19.0).abs() < 1e-5);
        assert_eq!(m.evaluate(3.0), 20.0);
    }

    #[test]
    fn test_materialize_reuses_buffer() {
        let curve = SampledCurve::from_easing(EasingKind::CubicOut, 16);
        let mut m = MaterializedCurve::default();
        m.materialize(&curve, 0.0, 1.0, 1.0);
        let capacity = m.keys.capacity();

        m.clear();
        m.materialize(&SampledCurve::linear(), 5.0, 6.0, 1.0);
        assert_eq!(m.keys.capacity(), capacity);
        assert_eq!(m.keys().len(), 2);
    }
}
