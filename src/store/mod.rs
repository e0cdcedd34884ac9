//! In-memory stores shared by the request path and the background refresher.
//!
//! Each store owns its synchronization. Critical sections cover a single map access and
//! never span an upstream call.

pub mod memory;
pub mod rates;

pub use memory::SnapshotStore;
pub use rates::{RateQuote, RateStore, RateTable};
