//! Application Services
//!
//! Ledgers shared by several use cases. They operate on a caller-supplied
//! transaction and never commit on their own.

pub mod price_ledger;
pub mod stock_ledger;
