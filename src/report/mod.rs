//! Reporting: the week-over-week comparison and its text rendering.

pub mod compare;
pub mod format;
pub mod money;

pub use compare::*;
pub use format::*;
