//! Procedural aptitude question generation.
//!
//! Each category has a pure generator drawing random parameters from fixed
//! domain ranges and producing one item with a worked solution. The bank
//! assembler over-generates into a deduplicated pool and samples it down.

mod bank;
mod numeric;

pub use bank::{BANK_FLOOR, BankError, assemble};
pub use numeric::generate;
