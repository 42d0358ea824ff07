//! Tween instance pools
//!
//! Finished tweens are reset and parked in a per-value-type pool instead
//! of being dropped, so steady-state animation does not allocate. Pools are
//! LIFO and bounded; releases past the cap drop the instance.

use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;

use crate::tween::Tween;
use crate::values::TweenValue;

/// Bounded LIFO pool of idle tweens of one value type
pub struct Pool<V: TweenValue> {
    free: Vec<Box<Tween<V>>>,
    capacity: usize,
}

impl<V: TweenValue> Pool<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::new(),
            capacity,
        }
    }

    /// Pop the most recently released tween, or allocate a fresh one
    ///
    /// The second value is `true` when the instance was reused.
    pub fn take(&mut self) -> (Box<Tween<V>>, bool) {
        match self.free.pop() {
            Some(tween) => (tween, true),
            None => (Box::new(Tween::new()), false),
        }
    }

    /// Park an idle tween; dropped if the pool is full
    pub fn put(&mut self, tween: Box<Tween<V>>) {
        if self.free.len() < self.capacity {
            self.free.push(tween);
        }
    }

    /// Allocate idle tweens until `count` are pooled (bounded by capacity)
    ///
    /// Returns how many instances were allocated.
    pub fn fill(&mut self, count: usize) -> usize {
        let target = count.min(self.capacity);
        let before = self.free.len();
        while self.free.len() < target {
            self.free.push(Box::new(Tween::new()));
        }
        self.free.len().saturating_sub(before)
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Tween<V>> {
        self.free.iter().map(|t| t.as_ref())
    }
}

/// One pool per value type, created on first use
pub(crate) struct PoolSet {
    pools: FxHashMap<TypeId, Box<dyn Any>>,
    capacity: usize,
}

impl PoolSet {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            pools: FxHashMap::default(),
            capacity,
        }
    }

    pub(crate) fn pool_mut<V: TweenValue>(&mut self) -> &mut Pool<V> {
        let capacity = self.capacity;
        let entry = self
            .pools
            .entry(TypeId::of::<V>())
            .or_insert_with(|| Box::new(Pool::<V>::new(capacity)));
        match entry.downcast_mut::<Pool<V>>() {
            Some(pool) => pool,
            // Keyed by TypeId::of::<V>, so the downcast cannot miss
            None => unreachable!("pool registered under a foreign TypeId"),
        }
    }

    pub(crate) fn pool<V: TweenValue>(&self) -> Option<&Pool<V>> {
        self.pools
            .get(&TypeId::of::<V>())
            .and_then(|pool| pool.downcast_ref::<Pool<V>>())
    }

    pub(crate) fn clear(&mut self) {
        self.pools.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tween::TweenState;
    use lilt_core::Color;

    #[test]
    fn test_take_allocates_when_empty() {
        let mut pool = Pool::<f32>::new(4);
        let (tween, reused) = pool.take();
        assert!(!reused);
        assert_eq!(tween.state(), TweenState::Idle);
    }

    #[test]
    fn test_lifo_reuse() {
        let mut pool = Pool::<f32>::new(4);
        let a = Box::new(Tween::new());
        let b = Box::new(Tween::new());
        let b_addr = &*b as *const Tween<f32>;
        pool.put(a);
        pool.put(b);

        let (taken, reused) = pool.take();
        assert!(reused);
        assert_eq!(&*taken as *const Tween<f32>, b_addr);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_capacity_cap() {
        let mut pool = Pool::<i32>::new(2);
        for _ in 0..5 {
            pool.put(Box::new(Tween::new()));
        }
        assert_eq!(pool.len(), 2);

        let mut pool = Pool::<i32>::new(3);
        assert_eq!(pool.fill(10), 3);
        assert_eq!(pool.fill(10), 0);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_pool_set_separates_types() {
        let mut pools = PoolSet::new(8);
        pools.pool_mut::<f32>().fill(2);
        pools.pool_mut::<Color>().fill(1);

        assert_eq!(pools.pool::<f32>().map(Pool::len), Some(2));
        assert_eq!(pools.pool::<Color>().map(Pool::len), Some(1));
        assert!(pools.pool::<i32>().is_none());

        pools.clear();
        assert!(pools.pool::<f32>().is_none());
    }
}
