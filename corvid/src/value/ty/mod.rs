//! Builtin payload types of the corvid runtime.
//!
//! Each type here is an alias for the plain Rust type that carries it, plus
//! the [`AnyData`](crate::AnyData) impl that teaches [`Any`](crate::Any)
//! how to copy, compare, render, and convert it.

mod boolean;
mod character;
mod float;
mod integer;
mod text;

pub use boolean::Boolean;
pub use character::Character;
pub use float::Float;
pub use integer::Integer;
pub use text::Text;
