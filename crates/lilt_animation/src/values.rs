//! Animatable value types
//!
//! A tween never interpolates a value as a whole. It splits the value into
//! scalar components, runs the same curve over each component, and
//! reassembles the result. [`TweenValue`] is that contract; it is
//! implemented here for the built-in value types:
//!
//! | Type    | Components |
//! |---------|------------|
//! | `i32`   | 1 (rounded to the nearest integer on reassembly) |
//! | `f32`   | 1          |
//! | `Vec2`  | 2 (x, y)   |
//! | `Vec3`  | 3 (x, y, z)|
//! | `Vec4`  | 4 (x, y, z, w) |
//! | `Color` | 4 (r, g, b, a) |

use lilt_core::{Color, Vec2, Vec3, Vec4};
use smallvec::SmallVec;

use crate::error::TweenError;

/// Component buffer sized for every built-in value type
pub type Components = SmallVec<[f32; 4]>;

/// A value a tween can animate
pub trait TweenValue: Copy + 'static {
    /// Number of independently interpolated scalar components
    const COMPONENTS: usize;

    /// Read component `index` (`index < COMPONENTS`)
    fn component(&self, index: usize) -> f32;

    /// Rebuild a value from exactly `COMPONENTS` scalars
    fn from_components(components: &[f32]) -> Self;

    /// Rebuild a value by computing each component
    fn from_fn(f: impl FnMut(usize) -> f32) -> Self {
        let components: Components = (0..Self::COMPONENTS).map(f).collect();
        Self::from_components(&components)
    }
}

// ============================================================================
// Scalar Implementations
// ============================================================================

impl TweenValue for f32 {
    const COMPONENTS: usize = 1;

    fn component(&self, _index: usize) -> f32 {
        *self
    }

    fn from_components(components: &[f32]) -> Self {
        components[0]
    }
}

impl TweenValue for i32 {
    const COMPONENTS: usize = 1;

    fn component(&self, _index: usize) -> f32 {
        *self as f32
    }

    fn from_components(components: &[f32]) -> Self {
        // `as` saturates, and maps NaN to 0
        components[0].round() as i32
    }
}

// ============================================================================
// Vector Implementations
// ============================================================================

impl TweenValue for Vec2 {
    const COMPONENTS: usize = 2;

    fn component(&self, index: usize) -> f32 {
        self.to_array()[index]
    }

    fn from_components(components: &[f32]) -> Self {
        Vec2::new(components[0], components[1])
    }
}

impl TweenValue for Vec3 {
    const COMPONENTS: usize = 3;

    fn component(&self, index: usize) -> f32 {
        self.to_array()[index]
    }

    fn from_components(components: &[f32]) -> Self {
        Vec3::new(components[0], components[1], components[2])
    }
}

impl TweenValue for Vec4 {
    const COMPONENTS: usize = 4;

    fn component(&self, index: usize) -> f32 {
        self.to_array()[index]
    }

    fn from_components(components: &[f32]) -> Self {
        Vec4::new(components[0], components[1], components[2], components[3])
    }
}

// ============================================================================
// Color Implementation
// ============================================================================

impl TweenValue for Color {
    const COMPONENTS: usize = 4;

    fn component(&self, index: usize) -> f32 {
        self.to_array()[index]
    }

    fn from_components(components: &[f32]) -> Self {
        Color::rgba(components[0], components[1], components[2], components[3])
    }
}

// ============================================================================
// Endpoints
// ============================================================================

/// Fallible accessor returning an endpoint value
pub type EndpointFn<V> = Box<dyn FnMut() -> Result<V, TweenError>>;

/// Where a tween gets its start or end value
///
/// Accessors are queried exactly once, when the tween's delay expires, so
/// a tween can chase a target that moves while it waits.
pub enum Endpoint<V> {
    /// A fixed value
    Value(V),
    /// A caller-supplied accessor
    Getter(EndpointFn<V>),
}

impl<V: TweenValue> Endpoint<V> {
    /// Wrap an accessor that cannot fail
    pub fn getter<F>(mut f: F) -> Self
    where
        F: FnMut() -> V + 'static,
    {
        Endpoint::Getter(Box::new(move || Ok(f())))
    }

    /// Wrap an accessor that may fail, e.g. because its target was destroyed
    ///
    /// A failure aborts the tween; it is never propagated to the tick loop.
    pub fn try_getter<F>(f: F) -> Self
    where
        F: FnMut() -> Result<V, TweenError> + 'static,
    {
        Endpoint::Getter(Box::new(f))
    }

    /// Produce the endpoint value
    pub fn resolve(&mut self) -> Result<V, TweenError> {
        match self {
            Endpoint::Value(value) => Ok(*value),
            Endpoint::Getter(f) => f(),
        }
    }
}

impl<V: TweenValue> From<V> for Endpoint<V> {
    fn from(value: V) -> Self {
        Endpoint::Value(value)
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for Endpoint<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Endpoint::Getter(_) => f.write_str("Getter(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn round_trip<V: TweenValue + PartialEq + std::fmt::Debug>(value: V) {
        let rebuilt = V::from_fn(|i| value.component(i));
        assert_eq!(rebuilt, value);
    }

    #[test]
    fn test_component_counts() {
        assert_eq!(<i32 as TweenValue>::COMPONENTS, 1);
        assert_eq!(<f32 as TweenValue>::COMPONENTS, 1);
        assert_eq!(Vec2::COMPONENTS, 2);
        assert_eq!(Vec3::COMPONENTS, 3);
        assert_eq!(Vec4::COMPONENTS, 4);
        assert_eq!(Color::COMPONENTS, 4);
    }

    #[test]
    fn test_components_round_trip() {
        round_trip(-7_i32);
        round_trip(2.5_f32);
        round_trip(Vec2::new(1.0, -2.0));
        round_trip(Vec3::new(1.0, 2.0, 3.0));
        round_trip(Vec4::new(1.0, 2.0, 3.0, 4.0));
        round_trip(Color::rgba(0.1, 0.2, 0.3, 0.4));
    }

    #[test]
    fn test_int_rounds_to_nearest() {
        assert_eq!(i32::from_components(&[2.4]), 2);
        assert_eq!(i32::from_components(&[2.5]), 3);
        assert_eq!(i32::from_components(&[-2.5]), -3);
        assert_eq!(i32::from_components(&[f32::NAN]), 0);
    }

    #[test]
    fn test_color_channel_order() {
        let c = Color::rgba(0.1, 0.2, 0.3, 0.4);
        assert_eq!(c.component(0), 0.1);
        assert_eq!(c.component(3), 0.4);
    }

    #[test]
    fn test_endpoint_getter_is_live() {
        let source = Rc::new(Cell::new(1.0_f32));
        let reader = source.clone();
        let mut endpoint = Endpoint::getter(move || reader.get());

        source.set(5.0);
        assert_eq!(endpoint.resolve().unwrap(), 5.0);
    }

    #[test]
    fn test_endpoint_failure() {
        let mut endpoint: Endpoint<f32> =
            Endpoint::try_getter(|| Err(TweenError::target_unavailable("gone")));
        assert!(matches!(
            endpoint.resolve(),
            Err(TweenError::TargetUnavailable(_))
        ));

        let mut literal: Endpoint<Vec2> = Vec2::ONE.into();
        assert_eq!(literal.resolve().unwrap(), Vec2::ONE);
    }
}
