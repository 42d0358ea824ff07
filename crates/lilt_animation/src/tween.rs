//! Tween lifecycle
//!
//! A [`Tween`] owns one in-flight interpolation between two values of a
//! [`TweenValue`] type. It moves through a small state machine:
//!
//! ```text
//!            delay > 0               delay elapsed
//!   Idle ───────────────► Delaying ─────────────────┐
//!     │                                             ▼
//!     └──────────── delay == 0 ──────────────────► Running ──► Completed
//!                                                    elapsed ≥ duration
//! ```
//!
//! Endpoints are resolved when the tween enters `Running`. While running,
//! every tick applies the curve-evaluated value; the final tick applies the
//! literal end value instead, so the terminal value is always exact.
//! `Completed` is terminal: the scheduler recycles the instance into its
//! pool straight away.
//!
//! Tweens are created and driven by the
//! [`TweenScheduler`](crate::scheduler::TweenScheduler); they are not
//! ticked on their own.

use std::fmt;

use smallvec::SmallVec;

use crate::clock::TickDelta;
use crate::curve::{MaterializedCurve, SampledCurve};
use crate::easing::{evaluate_value, EasingKind};
use crate::error::{AbortReason, TweenError};
use crate::pool::PoolSet;
use crate::values::{Endpoint, TweenValue};

/// Sink receiving each interpolated value
pub type ApplyFn<V> = Box<dyn FnMut(V)>;

/// Callback run once when a tween completes
pub type CompleteFn = Box<dyn FnOnce()>;

/// Callback run once when a tween aborts on its own (never on cancel)
pub type AbortFn = Box<dyn FnOnce(&AbortReason)>;

/// Identifier of a tween registered with a scheduler
///
/// Ids increase monotonically and are never reused while the scheduler lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TweenId(u64);

impl TweenId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        TweenId(raw)
    }

    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TweenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tween#{}", self.0)
    }
}

/// Lifecycle state of a tween
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TweenState {
    /// Pooled or not yet initialized
    #[default]
    Idle,
    /// Waiting for its delay to run out
    Delaying,
    /// Interpolating
    Running,
    /// Finished, about to be recycled
    Completed,
}

// ============================================================================
// Request
// ============================================================================

/// Everything needed to start a tween
///
/// # Example
///
/// ```ignore
/// let request = TweenRequest::<f32>::new(0.0, 1.0, 0.25)
///     .apply(move |v| opacity.set(v))
///     .delay(0.1)
///     .easing(EasingKind::CubicOut)
///     .on_complete(|| tracing::debug!("faded in"));
/// let id = scheduler.create(request);
/// ```
pub struct TweenRequest<V: TweenValue> {
    pub(crate) apply: Option<ApplyFn<V>>,
    pub(crate) start: Endpoint<V>,
    pub(crate) end: Endpoint<V>,
    pub(crate) duration: f32,
    pub(crate) delay: f32,
    pub(crate) easing: Option<EasingKind>,
    pub(crate) custom_curve: Option<SampledCurve>,
    pub(crate) on_complete: Option<CompleteFn>,
    pub(crate) on_abort: Option<AbortFn>,
    pub(crate) scaled_time: bool,
}

impl<V: TweenValue> TweenRequest<V> {
    /// Tween from `start` to `end` over `duration` seconds
    ///
    /// Both endpoints accept a literal value or an [`Endpoint`] accessor.
    /// Negative or non-finite durations are treated as 0.
    pub fn new(start: impl Into<Endpoint<V>>, end: impl Into<Endpoint<V>>, duration: f32) -> Self {
        Self {
            apply: None,
            start: start.into(),
            end: end.into(),
            duration: sanitize_seconds(duration),
            delay: 0.0,
            easing: None,
            custom_curve: None,
            on_complete: None,
            on_abort: None,
            scaled_time: false,
        }
    }

    /// Set the sink receiving interpolated values
    ///
    /// A request without a sink aborts on its first update.
    pub fn apply<F>(mut self, f: F) -> Self
    where
        F: FnMut(V) + 'static,
    {
        self.apply = Some(Box::new(f));
        self
    }

    /// Wait `delay` seconds before resolving endpoints and starting
    pub fn delay(mut self, delay: f32) -> Self {
        self.delay = sanitize_seconds(delay);
        self
    }

    /// Choose a built-in curve (defaults to the scheduler's configured easing)
    pub fn easing(mut self, kind: EasingKind) -> Self {
        self.easing = Some(kind);
        self
    }

    /// Use a custom curve; implies [`EasingKind::Custom`]
    ///
    /// Malformed curves are replaced with the linear curve.
    pub fn custom_curve(mut self, curve: SampledCurve) -> Self {
        self.easing = Some(EasingKind::Custom);
        self.custom_curve = Some(curve);
        self
    }

    /// Run `f` once when the tween completes naturally
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Run `f` once if the tween aborts by itself (missing sink, failed endpoint)
    pub fn on_abort<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&AbortReason) + 'static,
    {
        self.on_abort = Some(Box::new(f));
        self
    }

    /// Advance with the scaled tick delta instead of the unscaled one
    pub fn scaled_time(mut self, scaled: bool) -> Self {
        self.scaled_time = scaled;
        self
    }
}

impl<V: TweenValue> fmt::Debug for TweenRequest<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenRequest")
            .field("has_apply", &self.apply.is_some())
            .field("duration", &self.duration)
            .field("delay", &self.delay)
            .field("easing", &self.easing)
            .field("scaled_time", &self.scaled_time)
            .finish_non_exhaustive()
    }
}

fn sanitize_seconds(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

// ============================================================================
// Finish
// ============================================================================

/// How a tween left the active set, with the callbacks still to run
///
/// The scheduler recycles the tween first and runs the callbacks after, so
/// callbacks observe the tween as inactive and may start new tweens.
pub(crate) enum Finish {
    Completed {
        on_complete: Option<CompleteFn>,
    },
    Aborted {
        reason: AbortReason,
        on_complete: Option<CompleteFn>,
        on_abort: Option<AbortFn>,
    },
}

impl Finish {
    pub(crate) fn is_completed(&self) -> bool {
        matches!(self, Finish::Completed { .. })
    }

    pub(crate) fn run_callbacks(self) {
        match self {
            Finish::Completed { on_complete } => {
                if let Some(f) = on_complete {
                    f();
                }
            }
            Finish::Aborted {
                reason,
                on_complete,
                on_abort,
            } => {
                if let Some(f) = on_complete {
                    f();
                }
                if let Some(f) = on_abort {
                    f(&reason);
                }
            }
        }
    }
}

// ============================================================================
// Tween
// ============================================================================

/// One in-flight animation of a `V` value
pub struct Tween<V: TweenValue> {
    id: Option<TweenId>,
    state: TweenState,
    duration: f32,
    delay_remaining: f32,
    elapsed: f32,
    scaled_time: bool,
    easing: EasingKind,
    /// Normalized custom curve; buffer survives pooling
    curve: SampledCurve,
    /// Per-component materialized custom curves; buffers survive pooling
    tracks: SmallVec<[MaterializedCurve; 4]>,
    endpoints: Option<(V, V)>,
    apply: Option<ApplyFn<V>>,
    start: Option<Endpoint<V>>,
    end: Option<Endpoint<V>>,
    on_complete: Option<CompleteFn>,
    on_abort: Option<AbortFn>,
}

/// Tween of an integer value (interpolated values are rounded)
pub type IntTween = Tween<i32>;
/// Tween of a float value
pub type FloatTween = Tween<f32>;
/// Tween of a 2D vector
pub type Vec2Tween = Tween<lilt_core::Vec2>;
/// Tween of a 3D vector
pub type Vec3Tween = Tween<lilt_core::Vec3>;
/// Tween of a 4D vector
pub type Vec4Tween = Tween<lilt_core::Vec4>;
/// Tween of an RGBA color
pub type ColorTween = Tween<lilt_core::Color>;

impl<V: TweenValue> Default for Tween<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: TweenValue> Tween<V> {
    /// An idle, unregistered tween
    pub fn new() -> Self {
        Self {
            id: None,
            state: TweenState::Idle,
            duration: 0.0,
            delay_remaining: 0.0,
            elapsed: 0.0,
            scaled_time: false,
            easing: EasingKind::default(),
            curve: SampledCurve::linear(),
            tracks: SmallVec::new(),
            endpoints: None,
            apply: None,
            start: None,
            end: None,
            on_complete: None,
            on_abort: None,
        }
    }

    /// Id while registered, `None` while idle or pooled
    pub fn id(&self) -> Option<TweenId> {
        self.id
    }

    pub fn state(&self) -> TweenState {
        self.state
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Seconds spent running (0 while delaying)
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn easing(&self) -> EasingKind {
        self.easing
    }

    pub fn uses_scaled_time(&self) -> bool {
        self.scaled_time
    }

    /// Resolved `(start, end)` values, once running
    pub fn endpoints(&self) -> Option<(V, V)> {
        self.endpoints
    }

    /// Load a request and leave `Idle`
    ///
    /// Without a delay the endpoints are resolved immediately, which may
    /// abort the tween before it ever ticks.
    pub(crate) fn initialize(
        &mut self,
        id: TweenId,
        request: TweenRequest<V>,
        default_easing: EasingKind,
    ) -> Option<Finish> {
        let TweenRequest {
            apply,
            start,
            end,
            duration,
            delay,
            easing,
            custom_curve,
            on_complete,
            on_abort,
            scaled_time,
        } = request;

        self.id = Some(id);
        self.duration = duration;
        self.delay_remaining = delay;
        self.elapsed = 0.0;
        self.scaled_time = scaled_time;
        self.easing = easing.unwrap_or(default_easing);
        self.apply = apply;
        self.start = Some(start);
        self.end = Some(end);
        self.on_complete = on_complete;
        self.on_abort = on_abort;
        self.endpoints = None;

        if self.easing == EasingKind::Custom {
            match custom_curve {
                Some(curve) => self.curve.copy_from(&curve),
                None => self.curve.copy_from(&SampledCurve::linear()),
            }
            if !self.curve.normalize() {
                tracing::debug!("{id}: malformed custom curve, using linear");
            }
        }

        if delay > 0.0 {
            self.state = TweenState::Delaying;
            None
        } else {
            self.begin(0.0)
        }
    }

    /// Advance by one tick
    ///
    /// Returns `Some` once the tween has left the active set.
    pub(crate) fn update(&mut self, delta: TickDelta) -> Option<Finish> {
        if matches!(self.state, TweenState::Idle | TweenState::Completed) {
            return None;
        }
        if self.apply.is_none() {
            return Some(self.abort(AbortReason::MissingApplySink, false));
        }

        let dt = if self.scaled_time {
            delta.scaled
        } else {
            delta.unscaled
        };

        match self.state {
            TweenState::Delaying => {
                self.delay_remaining -= dt;
                if self.delay_remaining <= 0.0 {
                    let overshoot = -self.delay_remaining;
                    self.delay_remaining = 0.0;
                    return self.begin(overshoot);
                }
                None
            }
            TweenState::Running => {
                self.elapsed += dt;
                if self.elapsed >= self.duration {
                    self.apply_final();
                    return Some(self.complete());
                }
                self.apply_intermediate();
                None
            }
            TweenState::Idle | TweenState::Completed => None,
        }
    }

    /// End the tween without completing it
    ///
    /// `invoke_callback` runs the completion callback anyway. The abort
    /// callback only runs for aborts the tween raised itself.
    pub(crate) fn abort(&mut self, reason: AbortReason, invoke_callback: bool) -> Finish {
        if let Some(id) = self.id {
            tracing::debug!("{id}: aborted ({reason})");
        }
        self.state = TweenState::Completed;
        self.id = None;

        let on_complete = if invoke_callback {
            self.on_complete.take()
        } else {
            None
        };
        let on_abort = match reason {
            AbortReason::Cancelled => None,
            _ => self.on_abort.take(),
        };
        Finish::Aborted {
            reason,
            on_complete,
            on_abort,
        }
    }

    /// Drop every caller reference and return to `Idle`
    ///
    /// Buffers (curve keys, materialized tracks) keep their capacity.
    pub(crate) fn release(&mut self) {
        self.id = None;
        self.state = TweenState::Idle;
        self.duration = 0.0;
        self.delay_remaining = 0.0;
        self.elapsed = 0.0;
        self.scaled_time = false;
        self.easing = EasingKind::default();
        self.endpoints = None;
        self.apply = None;
        self.start = None;
        self.end = None;
        self.on_complete = None;
        self.on_abort = None;
        for track in &mut self.tracks {
            track.clear();
        }
    }

    /// Whether any caller closure is still referenced
    pub(crate) fn holds_caller_state(&self) -> bool {
        self.apply.is_some()
            || self.start.is_some()
            || self.end.is_some()
            || self.on_complete.is_some()
            || self.on_abort.is_some()
    }

    /// Resolve endpoints and enter `Running`, `elapsed` seconds in
    fn begin(&mut self, elapsed: f32) -> Option<Finish> {
        let resolved = match (self.start.as_mut(), self.end.as_mut()) {
            (Some(start), Some(end)) => start.resolve().and_then(|s| end.resolve().map(|e| (s, e))),
            _ => Err(TweenError::target_unavailable("endpoint already released")),
        };
        let (start, end) = match resolved {
            Ok(pair) => pair,
            Err(err) => return Some(self.abort(AbortReason::EndpointFailed(err), false)),
        };

        self.endpoints = Some((start, end));
        if self.easing == EasingKind::Custom {
            self.materialize_tracks(start, end);
        }
        self.elapsed = elapsed;
        self.state = TweenState::Running;
        None
    }

    fn materialize_tracks(&mut self, start: V, end: V) {
        self.tracks.resize_with(V::COMPONENTS, MaterializedCurve::default);
        for (i, track) in self.tracks.iter_mut().enumerate() {
            track.materialize(&self.curve, start.component(i), end.component(i), self.duration);
        }
    }

    fn apply_intermediate(&mut self) {
        let Some((start, end)) = self.endpoints else {
            return;
        };
        let value = if self.easing == EasingKind::Custom {
            let elapsed = self.elapsed;
            let tracks = &mut self.tracks;
            V::from_fn(|i| tracks[i].evaluate(elapsed))
        } else {
            evaluate_value(self.easing, start, end, self.elapsed, self.duration)
        };
        if let Some(apply) = self.apply.as_mut() {
            apply(value);
        }
    }

    fn apply_final(&mut self) {
        let Some((_, end)) = self.endpoints else {
            return;
        };
        if let Some(apply) = self.apply.as_mut() {
            apply(end);
        }
    }

    fn complete(&mut self) -> Finish {
        if let Some(id) = self.id {
            tracing::trace!("{id}: completed after {:.3}s", self.elapsed);
        }
        self.state = TweenState::Completed;
        self.id = None;
        Finish::Completed {
            on_complete: self.on_complete.take(),
        }
    }
}

// ============================================================================
// Type-erased tween
// ============================================================================

/// Object-safe view of a `Tween<V>` used by the scheduler's active set
pub(crate) trait AnyTween {
    fn update(&mut self, delta: TickDelta) -> Option<Finish>;
    fn abort(&mut self, reason: AbortReason, invoke_callback: bool) -> Finish;
    /// Drop caller state; may run caller `Drop` impls
    fn release(&mut self);
    /// Hand a released instance back to its pool
    fn into_pool(self: Box<Self>, pools: &mut PoolSet);
}

impl<V: TweenValue> AnyTween for Tween<V> {
    fn update(&mut self, delta: TickDelta) -> Option<Finish> {
        Tween::update(self, delta)
    }

    fn abort(&mut self, reason: AbortReason, invoke_callback: bool) -> Finish {
        Tween::abort(self, reason, invoke_callback)
    }

    fn release(&mut self) {
        Tween::release(self)
    }

    fn into_pool(self: Box<Self>, pools: &mut PoolSet) {
        debug_assert!(!self.holds_caller_state());
        pools.pool_mut::<V>().put(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilt_core::{Color, Vec2};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn recorder<V: TweenValue>() -> (Rc<RefCell<Vec<V>>>, impl FnMut(V) + 'static) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        (log, move |v| sink.borrow_mut().push(v))
    }

    fn start<V: TweenValue>(request: TweenRequest<V>) -> (Tween<V>, Option<Finish>) {
        let mut tween = Tween::new();
        let finish = tween.initialize(TweenId::from_raw(1), request, EasingKind::QuinticOut);
        (tween, finish)
    }

    #[test]
    fn test_linear_float_lifecycle() {
        let (log, sink) = recorder::<f32>();
        let (mut tween, finish) =
            start(TweenRequest::<f32>::new(0.0, 10.0, 1.0).apply(sink).easing(EasingKind::Linear));
        assert!(finish.is_none());
        assert_eq!(tween.state(), TweenState::Running);

        assert!(tween.update(TickDelta::uniform(0.5)).is_none());
        assert_eq!(*log.borrow(), vec![5.0]);

        let finish = tween.update(TickDelta::uniform(0.5)).unwrap();
        assert!(finish.is_completed());
        assert_eq!(*log.borrow(), vec![5.0, 10.0]);
        assert_eq!(tween.state(), TweenState::Completed);
        assert_eq!(tween.id(), None);
    }

    #[test]
    fn test_delay_then_run() {
        let (log, sink) = recorder::<f32>();
        let (mut tween, _) = start(
            TweenRequest::<f32>::new(0.0, 10.0, 1.0)
                .apply(sink)
                .delay(0.3)
                .easing(EasingKind::Linear),
        );
        assert_eq!(tween.state(), TweenState::Delaying);
        assert_eq!(tween.endpoints(), None);

        tween.update(TickDelta::uniform(0.3));
        assert_eq!(tween.state(), TweenState::Running);
        assert!(log.borrow().is_empty());

        tween.update(TickDelta::uniform(0.5));
        assert_eq!(*log.borrow(), vec![5.0]);
    }

    #[test]
    fn test_endpoints_resolve_at_delay_expiry() {
        let target = Rc::new(Cell::new(1.0_f32));
        let reader = target.clone();
        let (log, sink) = recorder::<f32>();
        let (mut tween, _) = start(
            TweenRequest::<f32>::new(0.0, Endpoint::getter(move || reader.get()), 1.0)
                .apply(sink)
                .delay(0.5),
        );

        target.set(8.0);
        tween.update(TickDelta::uniform(0.5));
        assert_eq!(tween.endpoints(), Some((0.0, 8.0)));

        tween.update(TickDelta::uniform(1.0));
        assert_eq!(log.borrow().last(), Some(&8.0));
    }

    #[test]
    fn test_scaled_time_selects_delta() {
        let (log, sink) = recorder::<f32>();
        let (mut tween, _) = start(
            TweenRequest::<f32>::new(0.0, 10.0, 1.0)
                .apply(sink)
                .easing(EasingKind::Linear)
                .scaled_time(true),
        );
        tween.update(TickDelta::new(0.1, 0.25));
        assert!((log.borrow()[0] - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_zero_duration_applies_end_only() {
        let (log, sink) = recorder::<Vec2>();
        let (mut tween, _) = start(TweenRequest::<Vec2>::new(Vec2::ZERO, Vec2::ONE, 0.0).apply(sink));
        assert!(tween.update(TickDelta::uniform(0.0)).unwrap().is_completed());
        assert_eq!(*log.borrow(), vec![Vec2::ONE]);
    }

    #[test]
    fn test_missing_sink_aborts_on_first_update() {
        let aborted = Rc::new(Cell::new(false));
        let flag = aborted.clone();
        let (mut tween, _) = start(
            TweenRequest::<f32>::new(0.0, 1.0, 1.0)
                .on_complete(|| unreachable!("must not complete"))
                .on_abort(move |reason| {
                    assert!(matches!(reason, AbortReason::MissingApplySink));
                    flag.set(true);
                }),
        );
        let finish = tween.update(TickDelta::uniform(0.1)).unwrap();
        assert!(!finish.is_completed());
        finish.run_callbacks();
        assert!(aborted.get());
    }

    #[test]
    fn test_endpoint_failure_aborts_at_initialize() {
        let (log, sink) = recorder::<f32>();
        let (tween, finish) = start(
            TweenRequest::<f32>::new(
                Endpoint::try_getter(|| Err(TweenError::target_unavailable("destroyed"))),
                1.0,
                1.0,
            )
            .apply(sink),
        );
        assert!(matches!(
            finish,
            Some(Finish::Aborted {
                reason: AbortReason::EndpointFailed(_),
                ..
            })
        ));
        assert_eq!(tween.state(), TweenState::Completed);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_cancel_with_callback() {
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let (mut tween, _) = start(
            TweenRequest::<f32>::new(0.0, 1.0, 1.0)
                .apply(|_| {})
                .delay(1.0)
                .on_complete(move || counter.set(counter.get() + 1)),
        );
        tween.abort(AbortReason::Cancelled, true).run_callbacks();
        assert_eq!(fired.get(), 1);
        assert!(tween.update(TickDelta::uniform(2.0)).is_none());
    }

    #[test]
    fn test_int_values_are_rounded() {
        let (log, sink) = recorder::<i32>();
        let (mut tween, _) =
            start(TweenRequest::<i32>::new(0, 10, 1.0).apply(sink).easing(EasingKind::Linear));
        tween.update(TickDelta::uniform(0.26));
        tween.update(TickDelta::uniform(0.26));
        assert_eq!(*log.borrow(), vec![3, 5]);
    }

    #[test]
    fn test_custom_curve_drives_every_component() {
        let (log, sink) = recorder::<Color>();
        let curve = SampledCurve::from_points(&[(0.0, 0.0), (0.5, 1.0), (1.0, 0.0)]);
        let (mut tween, _) = start(
            TweenRequest::<Color>::new(Color::BLACK, Color::WHITE, 2.0)
                .apply(sink)
                .custom_curve(curve),
        );
        tween.update(TickDelta::uniform(1.0));
        assert_eq!(log.borrow()[0], Color::WHITE);

        // Final value is the literal end, not the curve's last key
        tween.update(TickDelta::uniform(1.0));
        assert_eq!(log.borrow()[1], Color::WHITE);
    }

    #[test]
    fn test_malformed_custom_curve_uses_linear() {
        let (log, sink) = recorder::<f32>();
        let (mut tween, _) = start(
            TweenRequest::<f32>::new(0.0, 10.0, 1.0)
                .apply(sink)
                .custom_curve(SampledCurve::from_points(&[(0.3, 0.0)])),
        );
        tween.update(TickDelta::uniform(0.25));
        assert!((log.borrow()[0] - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_release_drops_caller_state() {
        let (_, sink) = recorder::<f32>();
        let (mut tween, _) = start(
            TweenRequest::<f32>::new(0.0, 1.0, 1.0)
                .apply(sink)
                .on_complete(|| {})
                .on_abort(|_| {}),
        );
        assert!(tween.holds_caller_state());
        tween.release();
        assert!(!tween.holds_caller_state());
        assert_eq!(tween.state(), TweenState::Idle);
        assert_eq!(tween.id(), None);
    }

    #[test]
    fn test_request_sanitizes_times() {
        let request = TweenRequest::<f32>::new(0.0, 1.0, -3.0).delay(f32::NAN);
        assert_eq!(request.duration, 0.0);
        assert_eq!(request.delay, 0.0);
    }
}
