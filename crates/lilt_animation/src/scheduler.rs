//! Tween scheduler
//!
//! Owns every active tween and the per-value-type pools, and advances all
//! active tweens once per host tick in registration order.
//!
//! The scheduler is an explicit object owned by the host; there is no
//! global instance. Code that needs to start or cancel tweens later
//! (including the tweens' own callbacks) holds a weak [`SchedulerHandle`].
//!
//! # Re-entrancy
//!
//! Apply sinks, endpoint accessors and callbacks run with no internal
//! borrow held, so they may freely call back into the scheduler:
//!
//! - tweens created during a tick are first advanced on the next tick
//! - cancelling the tween whose update is running takes effect when that
//!   update returns; `is_active` reports `false` straight away
//! - completion and abort callbacks run after the tween has been recycled
//!
//! ```ignore
//! let scheduler = TweenScheduler::new();
//! let handle = scheduler.handle();
//!
//! scheduler.create(
//!     TweenRequest::<f32>::new(0.0, 1.0, 0.3)
//!         .apply(move |v| node.set_opacity(v))
//!         .on_complete(move || {
//!             handle.create(TweenRequest::new(1.0_f32, 0.0, 0.3).apply(|_| {}));
//!         }),
//! );
//!
//! loop {
//!     scheduler.tick_clock(&mut clock);
//! }
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;

use crate::clock::{FrameClock, TickDelta};
use crate::config::SchedulerConfig;
use crate::error::AbortReason;
use crate::pool::PoolSet;
use crate::tween::{AnyTween, Finish, TweenId, TweenRequest};
use crate::values::TweenValue;
use lilt_core::{Color, Vec2, Vec3, Vec4};

// ============================================================================
// Statistics
// ============================================================================

/// Counters accumulated over the scheduler's lifetime
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Tween instances allocated (including prewarmed ones)
    pub allocated: u64,
    /// Creates served from a pool
    pub reused: u64,
    /// Tweens that ran to their end value
    pub completed: u64,
    /// Tweens that aborted on their own
    pub aborted: u64,
    /// Tweens ended through `cancel`
    pub cancelled: u64,
}

// ============================================================================
// Inner State
// ============================================================================

/// Active-set entry
///
/// `tween` is `None` while its update is running. A cancel arriving in that
/// window is parked in `pending_cancel` and applied when the update returns.
struct Slot {
    tween: Option<Box<dyn AnyTween>>,
    pending_cancel: Option<bool>,
}

impl Slot {
    fn new(tween: Box<dyn AnyTween>) -> Self {
        Self {
            tween: Some(tween),
            pending_cancel: None,
        }
    }

    fn is_live(&self) -> bool {
        self.pending_cancel.is_none()
    }
}

struct SchedulerInner {
    active: IndexMap<TweenId, Slot, FxBuildHasher>,
    pools: PoolSet,
    next_id: u64,
    config: SchedulerConfig,
    stats: SchedulerStats,
    running: bool,
}

impl SchedulerInner {
    fn new(config: SchedulerConfig) -> Self {
        Self {
            active: IndexMap::default(),
            pools: PoolSet::new(config.pool_capacity),
            next_id: 0,
            config,
            stats: SchedulerStats::default(),
            running: true,
        }
    }

    fn prewarm<V: TweenValue>(&mut self, count: usize) -> usize {
        let allocated = self.pools.pool_mut::<V>().fill(count);
        self.stats.allocated += allocated as u64;
        allocated
    }

    fn is_active(&self, id: TweenId) -> bool {
        self.active.get(&id).is_some_and(Slot::is_live)
    }

    /// Register a tween; shared by the scheduler and its handles
    fn create<V: TweenValue>(
        this: &Rc<RefCell<Self>>,
        request: TweenRequest<V>,
    ) -> Option<TweenId> {
        let (id, mut tween, default_easing) = {
            let mut inner = this.borrow_mut();
            if !inner.running {
                tracing::debug!("create ignored: scheduler is shut down");
                return None;
            }
            inner.next_id += 1;
            let id = TweenId::from_raw(inner.next_id);
            let (tween, reused) = inner.pools.pool_mut::<V>().take();
            if reused {
                inner.stats.reused += 1;
            } else {
                inner.stats.allocated += 1;
            }
            (id, tween, inner.config.default_easing)
        };

        // May run endpoint accessors
        let finish = tween.initialize(id, request, default_easing);

        match finish {
            None if this.borrow().running => {
                tracing::trace!("{id}: created");
                this.borrow_mut().active.insert(id, Slot::new(tween));
            }
            None => {
                // Shut down from inside an accessor
                tween.release();
            }
            Some(finish) => {
                tween.release();
                {
                    let mut inner = this.borrow_mut();
                    inner.stats.aborted += 1;
                    tween.into_pool(&mut inner.pools);
                }
                finish.run_callbacks();
            }
        }
        Some(id)
    }

    fn cancel(this: &Rc<RefCell<Self>>, id: TweenId, invoke_callback: bool) -> bool {
        let mut tween = {
            let mut inner = this.borrow_mut();
            let Some(slot) = inner.active.get_mut(&id) else {
                return false;
            };
            if !slot.is_live() {
                return false;
            }
            if slot.tween.is_none() {
                // Update in flight; finished by the tick loop
                slot.pending_cancel = Some(invoke_callback);
                inner.stats.cancelled += 1;
                return true;
            }
            match inner.active.shift_remove(&id).and_then(|slot| slot.tween) {
                Some(tween) => {
                    inner.stats.cancelled += 1;
                    tween
                }
                None => return false,
            }
        };

        let finish = tween.abort(AbortReason::Cancelled, invoke_callback);
        recycle(this, tween);
        finish.run_callbacks();
        true
    }
}

/// Release caller state outside any borrow, then pool the instance
fn recycle(this: &Rc<RefCell<SchedulerInner>>, mut tween: Box<dyn AnyTween>) {
    tween.release();
    let mut inner = this.borrow_mut();
    if inner.running {
        let pools = &mut inner.pools;
        tween.into_pool(pools);
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// Owner and driver of all active tweens
///
/// Single-threaded: the scheduler, its handles and every callback live on
/// the thread that calls [`tick`](Self::tick).
pub struct TweenScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl Default for TweenScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TweenScheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create a scheduler, prewarming each built-in value type's pool
    pub fn with_config(config: SchedulerConfig) -> Self {
        let prewarm = config.prewarm;
        let mut inner = SchedulerInner::new(config);
        if prewarm > 0 {
            inner.prewarm::<i32>(prewarm);
            inner.prewarm::<f32>(prewarm);
            inner.prewarm::<Vec2>(prewarm);
            inner.prewarm::<Vec3>(prewarm);
            inner.prewarm::<Vec4>(prewarm);
            inner.prewarm::<Color>(prewarm);
            tracing::debug!("prewarmed {prewarm} tweens per value type");
        }
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// Get a weak handle for components and callbacks
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> SchedulerConfig {
        self.inner.borrow().config.clone()
    }

    /// Start a tween
    ///
    /// Returns `None` once the scheduler has been shut down. A tween whose
    /// endpoints fail to resolve immediately still gets an id, but is
    /// never active.
    pub fn create<V: TweenValue>(&self, request: TweenRequest<V>) -> Option<TweenId> {
        SchedulerInner::create(&self.inner, request)
    }

    /// Advance every active tween
    ///
    /// Returns `true` while tweens remain active.
    pub fn tick(&self, unscaled: f32, scaled: f32) -> bool {
        self.tick_delta(TickDelta::new(unscaled, scaled))
    }

    /// Advance every active tween by a host-measured delta
    pub fn tick_clock(&self, clock: &mut FrameClock) -> bool {
        match clock.advance() {
            Some(delta) => self.tick_delta(delta),
            None => self.has_active(),
        }
    }

    pub fn tick_delta(&self, delta: TickDelta) -> bool {
        let ids: SmallVec<[TweenId; 32]> = {
            let inner = self.inner.borrow();
            if !inner.running {
                return false;
            }
            inner.active.keys().copied().collect()
        };

        for id in ids {
            let mut tween = {
                let mut inner = self.inner.borrow_mut();
                match inner.active.get_mut(&id) {
                    Some(slot) if slot.is_live() => match slot.tween.take() {
                        Some(tween) => tween,
                        None => continue,
                    },
                    _ => continue,
                }
            };

            let finish = tween.update(delta);

            let pending_cancel = {
                let mut inner = self.inner.borrow_mut();
                let Some(slot) = inner.active.get_mut(&id) else {
                    // Shut down by the tween's own sink
                    drop(inner);
                    drop(tween);
                    return false;
                };
                match (slot.pending_cancel, finish.is_some()) {
                    (None, false) => {
                        slot.tween = Some(tween);
                        continue;
                    }
                    (pending, _) => {
                        inner.active.shift_remove(&id);
                        pending
                    }
                }
            };

            let finish = match (pending_cancel, finish) {
                (Some(invoke), Some(finish)) => finish.into_cancelled(invoke),
                (Some(invoke), None) => tween.abort(AbortReason::Cancelled, invoke),
                (None, Some(finish)) => {
                    let mut inner = self.inner.borrow_mut();
                    if finish.is_completed() {
                        inner.stats.completed += 1;
                    } else {
                        inner.stats.aborted += 1;
                    }
                    finish
                }
                (None, None) => continue,
            };
            recycle(&self.inner, tween);
            finish.run_callbacks();
        }

        self.has_active()
    }

    /// Whether `id` is in the active set
    pub fn is_active(&self, id: TweenId) -> bool {
        self.inner.borrow().is_active(id)
    }

    /// End a tween early
    ///
    /// With `invoke_callback` the completion callback runs once, before
    /// this returns (or, if called from the tween's own sink, as soon as
    /// its update returns). Returns `false` for unknown or finished ids.
    pub fn cancel(&self, id: TweenId, invoke_callback: bool) -> bool {
        SchedulerInner::cancel(&self.inner, id, invoke_callback)
    }

    /// Abort every tween without callbacks and refuse new ones
    pub fn shutdown(&self) {
        let (active, pooled) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.running {
                return;
            }
            inner.running = false;
            let active = std::mem::take(&mut inner.active);
            let pooled = std::mem::replace(&mut inner.pools, PoolSet::new(0));
            (active, pooled)
        };
        tracing::debug!("scheduler shut down with {} active tweens", active.len());
        // Caller closures are dropped here, outside the borrow
        drop(active);
        drop(pooled);
    }

    /// `false` after [`shutdown`](Self::shutdown)
    pub fn is_running(&self) -> bool {
        self.inner.borrow().running
    }

    pub fn has_active(&self) -> bool {
        self.active_count() > 0
    }

    pub fn active_count(&self) -> usize {
        self.inner
            .borrow()
            .active
            .values()
            .filter(|slot| slot.is_live())
            .count()
    }

    /// Idle instances currently pooled for value type `V`
    pub fn pooled_count<V: TweenValue>(&self) -> usize {
        self.inner
            .borrow()
            .pools
            .pool::<V>()
            .map_or(0, |pool| pool.len())
    }

    /// Allocate up to `count` idle instances for `V` ahead of time
    ///
    /// Returns how many were allocated.
    pub fn prewarm<V: TweenValue>(&self, count: usize) -> usize {
        let mut inner = self.inner.borrow_mut();
        if !inner.running {
            return 0;
        }
        inner.prewarm::<V>(count)
    }

    pub fn stats(&self) -> SchedulerStats {
        self.inner.borrow().stats
    }
}

impl Finish {
    /// Re-label a finish that raced with a cancel from inside the update
    fn into_cancelled(self, invoke_callback: bool) -> Finish {
        let on_complete = match self {
            Finish::Completed { on_complete } | Finish::Aborted { on_complete, .. } => on_complete,
        };
        Finish::Aborted {
            reason: AbortReason::Cancelled,
            on_complete: on_complete.filter(|_| invoke_callback),
            on_abort: None,
        }
    }
}

// ============================================================================
// Handle
// ============================================================================

/// A weak handle to the tween scheduler
///
/// Cheap to clone and safe to capture in callbacks. It won't keep the
/// scheduler alive; every operation is a no-op once the scheduler is
/// dropped or shut down.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<RefCell<SchedulerInner>>,
}

impl SchedulerHandle {
    pub fn create<V: TweenValue>(&self, request: TweenRequest<V>) -> Option<TweenId> {
        self.inner
            .upgrade()
            .and_then(|inner| SchedulerInner::create(&inner, request))
    }

    pub fn is_active(&self, id: TweenId) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.borrow().is_active(id))
    }

    pub fn cancel(&self, id: TweenId, invoke_callback: bool) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| SchedulerInner::cancel(&inner, id, invoke_callback))
    }

    /// Whether the scheduler still exists and accepts tweens
    pub fn is_alive(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.borrow().running)
    }
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}
