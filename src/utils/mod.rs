//! Utility Module
//!
//! - [`time`]: platform-neutral `Instant`/`Duration` and the [`FrameTimer`] that turns
//!   display callbacks into frame samples.
//! - [`logging`]: console logger for `wasm32` hosts.

pub mod logging;
pub mod time;

pub use time::{Duration, FrameTimer, Instant};
