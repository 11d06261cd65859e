//! Request handlers.

pub mod control;
pub mod screenshot;
pub mod viewer;
