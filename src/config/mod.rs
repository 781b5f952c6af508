pub mod server;
pub mod validator;

pub use server::*;
pub use validator::*;
