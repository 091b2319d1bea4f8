//! Route-level structs: AS paths and announced prefix records.

mod aspath;
mod record;

pub use aspath::*;
pub use record::*;
