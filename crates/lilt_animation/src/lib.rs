//! Lilt Animation Engine
//!
//! Pooled, tick-driven tweens for scalars, vectors and colors.
//!
//! # Features
//!
//! - **Easing Library**: linear, cubic/quintic/septic in/out/in-out/soft-out, overshoot, bounce
//! - **Custom Curves**: piecewise-linear sampled curves, validated with a linear fallback
//! - **Typed Tweens**: one generic lifecycle over `i32`, `f32`, `Vec2`, `Vec3`, `Vec4` and `Color`
//! - **Delays**: endpoints are read when the delay expires, so tweens can chase moving targets
//! - **Pooling**: finished tweens are recycled per value type
//! - **Re-entrant Scheduler**: callbacks may create and cancel tweens mid-tick
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use lilt_animation::{EasingKind, TweenRequest, TweenScheduler};
//!
//! let scheduler = TweenScheduler::new();
//! let value = Rc::new(Cell::new(0.0_f32));
//! let sink = value.clone();
//!
//! let id = scheduler
//!     .create(
//!         TweenRequest::<f32>::new(0.0, 10.0, 1.0)
//!             .easing(EasingKind::Linear)
//!             .apply(move |v| sink.set(v)),
//!     )
//!     .unwrap();
//!
//! scheduler.tick(0.5, 0.5);
//! assert_eq!(value.get(), 5.0);
//!
//! scheduler.tick(0.5, 0.5);
//! assert_eq!(value.get(), 10.0);
//! assert!(!scheduler.is_active(id));
//! ```

pub mod clock;
pub mod config;
pub mod curve;
pub mod easing;
pub mod error;
pub mod pool;
pub mod scheduler;
pub mod tween;
pub mod values;

pub use clock::{FrameClock, TickDelta};
pub use config::SchedulerConfig;
pub use curve::{CurveCursor, CurveKey, MaterializedCurve, SampledCurve, DEFAULT_CURVE_STEPS};
pub use easing::{ease, evaluate, evaluate_value, EasingKind};
pub use error::{AbortReason, Result, TweenError};
pub use pool::Pool;
pub use scheduler::{SchedulerHandle, SchedulerStats, TweenScheduler};
pub use tween::{
    AbortFn, ApplyFn, ColorTween, CompleteFn, FloatTween, IntTween, Tween, TweenId, TweenRequest,
    TweenState, Vec2Tween, Vec3Tween, Vec4Tween,
};
pub use values::{Components, Endpoint, EndpointFn, TweenValue};

pub use lilt_core::{Color, Vec2, Vec3, Vec4};
