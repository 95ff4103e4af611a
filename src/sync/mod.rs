//! Channel synchronization: the per-family controller, its in-flight guard,
//! the teardown capability it hands out, and the reconnect supervisor.

pub mod controller;
pub mod guard;
pub mod supervisor;
pub mod teardown;

pub use controller::{
    ControllerState, CountdownPolicy, SyncController, UpdateOutcome, ADVISOR_COUNTDOWN_KEY,
    CLIENT_COUNTDOWN_KEY, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL,
};
pub use guard::{InFlightGuard, InFlightPermit};
pub use supervisor::supervise;
pub use teardown::TeardownHandle;
