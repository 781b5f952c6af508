//! Query-parameter interpretation: pagination, filters, ordering, and the select they build.

mod builder;
mod filter;
mod pagination;
mod params;
mod sanitize;

pub use builder::*;
pub use filter::*;
pub use pagination::*;
pub use params::QueryParams;
pub use sanitize::{is_identifier, sanitize_order_field};
