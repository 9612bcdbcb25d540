//! Network and CPU throttling via Chrome DevTools Protocol
//!
//! Applied once per session, right after the page is opened, so that the
//! navigation and the whole interaction window run under the device's
//! constraints.

pub mod cpu;
pub mod network;

pub use cpu::CpuThrottler;
pub use network::NetworkThrottler;

pub use crate::config::NetworkProfile;
