//! Lilt Core
//!
//! Foundational value types shared by the Lilt crates:
//!
//! - **Vectors**: `Vec2`, `Vec3` and `Vec4` with f32 components
//! - **Color**: linear-space RGBA color with f32 channels
//!
//! These are plain `Copy` data. The tween engine in `lilt_animation`
//! interpolates them component by component.
//!
//! # Example
//!
//! ```rust
//! use lilt_core::{Color, Vec2};
//!
//! let a = Vec2::new(0.0, 10.0);
//! let b = Vec2::new(10.0, 20.0);
//! assert_eq!(a.lerp(b, 0.5), Vec2::new(5.0, 15.0));
//!
//! let red = Color::from_hex(0xFF0000);
//! assert_eq!(red, Color::RED);
//! ```

pub mod math;

pub use math::{Color, Vec2, Vec3, Vec4};
