//! Request handlers.

pub mod cameras;
pub mod falls;
pub mod health;

pub use cameras::*;
pub use falls::*;
pub use health::*;
