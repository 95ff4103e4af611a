//! Circular countdowns showing how long a secret stays valid.

pub mod driver;
pub mod phase;

pub use driver::{CountdownDriver, CountdownTicket, DEFAULT_TICK, MIN_TICK};
pub use phase::{phase_degrees, DEFAULT_TOTAL_DURATION_SECS};
