//! Concrete entities served by this crate's server.

pub mod user;

pub use user::User;
