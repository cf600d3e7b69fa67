//! Support library for the smallplate CLI binary.
//!
//! Exposes the CLI and logging modules so integration tests and doctests can
//! exercise the render pipeline without spawning a subprocess.

pub mod cli;
pub mod logging;
