//! Keeps local folders pushed to hosted git repositories on a timer.

pub mod daemon;
pub mod logging;
