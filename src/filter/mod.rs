pub mod types;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod field_alias;
pub mod error;

pub use types::*;
pub use filter::Filter;
pub use field_alias::{normalize_field, LegacyField};
