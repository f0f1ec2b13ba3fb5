//! Checks and helpers for merged invoice values.

pub mod amounts;
mod validate;

pub use amounts::{format_amount, parse_amount, parse_amount_str};
pub use validate::validate;
