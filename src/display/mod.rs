//! Secret display: the adapter writing payloads into slots, and an
//! in-memory host view providing those slots.

pub mod adapter;
pub mod board;

pub use adapter::{SecretDisplayAdapter, SlotPair, UPDATING_KEY};
pub use board::{BoardSlot, SlotBoard, SlotView};
