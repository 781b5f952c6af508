//! Entity specializations: viewsets that override or extend the generic operations.

pub mod user;

pub use user::{seed_sample_users, user_viewset};
