//! Easing functions for tweens
//!
//! Every curve is a unit-interval shape `t -> progress` with `progress(0) = 0`
//! and `progress(1) = 1`. [`evaluate`] maps a shape onto a real
//! `(start, end, elapsed, duration)` range and pins both boundaries exactly,
//! so floating-point drift can never leave a value short of its target.
//! [`evaluate_value`] does the same for any [`TweenValue`], one scalar
//! evaluation per component.

use serde::{Deserialize, Serialize};

use crate::values::TweenValue;

/// Overshoot amount of the [`EasingKind::Overshoot`] curve (about 10% past the end)
const OVERSHOOT: f32 = 1.70158;

/// Curve shape of a tween
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingKind {
    /// Caller-supplied [`SampledCurve`](crate::curve::SampledCurve)
    Custom,
    Linear,
    /// Decelerates past the end value once, then settles back
    Overshoot,
    /// Lands on the end value with a series of decaying bounces
    Bounce,
    CubicIn,
    CubicOut,
    CubicInOut,
    CubicSoftOut,
    QuinticIn,
    #[default]
    QuinticOut,
    QuinticInOut,
    QuinticSoftOut,
    SepticIn,
    SepticOut,
    SepticInOut,
    SepticSoftOut,
}

impl EasingKind {
    /// Every built-in curve (all kinds except [`EasingKind::Custom`])
    pub const ALL: [EasingKind; 15] = [
        EasingKind::Linear,
        EasingKind::Overshoot,
        EasingKind::Bounce,
        EasingKind::CubicIn,
        EasingKind::CubicOut,
        EasingKind::CubicInOut,
        EasingKind::CubicSoftOut,
        EasingKind::QuinticIn,
        EasingKind::QuinticOut,
        EasingKind::QuinticInOut,
        EasingKind::QuinticSoftOut,
        EasingKind::SepticIn,
        EasingKind::SepticOut,
        EasingKind::SepticInOut,
        EasingKind::SepticSoftOut,
    ];

    /// Apply the curve to a progress value (0.0 to 1.0)
    ///
    /// `Custom` has no formula of its own and behaves as `Linear` here;
    /// custom shapes are sampled from their curve instead.
    pub fn apply(self, t: f32) -> f32 {
        match self {
            EasingKind::Custom | EasingKind::Linear => t,
            EasingKind::Overshoot => overshoot(t),
            EasingKind::Bounce => bounce(t),
            EasingKind::CubicIn => ease_in(t, 3),
            EasingKind::CubicOut => ease_out(t, 3),
            EasingKind::CubicInOut => ease_in_out(t, 3),
            EasingKind::CubicSoftOut => soft_out(t, 3),
            EasingKind::QuinticIn => ease_in(t, 5),
            EasingKind::QuinticOut => ease_out(t, 5),
            EasingKind::QuinticInOut => ease_in_out(t, 5),
            EasingKind::QuinticSoftOut => soft_out(t, 5),
            EasingKind::SepticIn => ease_in(t, 7),
            EasingKind::SepticOut => ease_out(t, 7),
            EasingKind::SepticInOut => ease_in_out(t, 7),
            EasingKind::SepticSoftOut => soft_out(t, 7),
        }
    }

    /// Whether the curve never leaves `[start, end]` and never reverses
    pub fn is_monotonic(self) -> bool {
        !matches!(
            self,
            EasingKind::Custom | EasingKind::Overshoot | EasingKind::Bounce
        )
    }
}

// ============================================================================
// Curve shapes
// ============================================================================

fn ease_in(t: f32, order: i32) -> f32 {
    t.powi(order)
}

fn ease_out(t: f32, order: i32) -> f32 {
    1.0 - (1.0 - t).powi(order)
}

fn ease_in_out(t: f32, order: i32) -> f32 {
    if t < 0.5 {
        2.0_f32.powi(order - 1) * t.powi(order)
    } else {
        1.0 - (2.0 - 2.0 * t).powi(order) / 2.0
    }
}

/// Even blend of the out and in-out curves of the same order
fn soft_out(t: f32, order: i32) -> f32 {
    (ease_out(t, order) + ease_in_out(t, order)) * 0.5
}

fn overshoot(t: f32) -> f32 {
    let u = t - 1.0;
    1.0 + (OVERSHOOT + 1.0) * u * u * u + OVERSHOOT * u * u
}

fn bounce(t: f32) -> f32 {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;

    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let u = t - 1.5 / D;
        N * u * u + 0.75
    } else if t < 2.5 / D {
        let u = t - 2.25 / D;
        N * u * u + 0.9375
    } else {
        let u = t - 2.625 / D;
        N * u * u + 0.984375
    }
}

// ============================================================================
// Range evaluation
// ============================================================================

/// Unit-interval shape of `kind`; `t` is not clamped
pub fn ease(kind: EasingKind, t: f32) -> f32 {
    kind.apply(t)
}

/// Evaluate `kind` between `start` and `end` after `elapsed` of `duration`
///
/// `elapsed` is clamped to `[0, duration]`. The result is exactly `start`
/// at the beginning and exactly `end` at the end; a non-positive duration
/// yields `end`.
pub fn evaluate(kind: EasingKind, start: f32, end: f32, elapsed: f32, duration: f32) -> f32 {
    match progress(elapsed, duration) {
        Progress::Start => start,
        Progress::End => end,
        Progress::Between(t) => start + (end - start) * kind.apply(t),
    }
}

/// Evaluate `kind` independently for every component of a value
pub fn evaluate_value<V: TweenValue>(
    kind: EasingKind,
    start: V,
    end: V,
    elapsed: f32,
    duration: f32,
) -> V {
    match progress(elapsed, duration) {
        Progress::Start => start,
        Progress::End => end,
        Progress::Between(t) => {
            let eased = kind.apply(t);
            V::from_fn(|i| {
                let a = start.component(i);
                a + (end.component(i) - a) * eased
            })
        }
    }
}

/// Normalized position within a duration
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Progress {
    Start,
    Between(f32),
    End,
}

pub(crate) fn progress(elapsed: f32, duration: f32) -> Progress {
    if !(duration > 0.0) {
        return Progress::End;
    }
    if elapsed.is_nan() || elapsed <= 0.0 {
        return Progress::Start;
    }
    if elapsed >= duration {
        return Progress::End;
    }
    let t = elapsed / duration;
    if t >= 1.0 {
        Progress::End
    } else {
        Progress::Between(t)
    }
}
