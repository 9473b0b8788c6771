//! Process-wide logging setup shared by the binaries and tests.

pub mod tracing;

pub use crate::tracing::{LogFormat, init, init_with};
