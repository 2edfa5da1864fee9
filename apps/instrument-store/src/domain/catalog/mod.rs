//! Catalog Bounded Context
//!
//! Instruments, their categories and the append-only price history from
//! which an instrument's current price is derived.

mod category;
mod instrument;
mod price_entry;

pub use category::Category;
pub use instrument::{Instrument, InstrumentDraft, InstrumentPatch};
pub use price_entry::{PriceEntry, current_price};
