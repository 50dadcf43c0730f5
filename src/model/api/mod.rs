pub mod auth;
pub mod responses;

pub use auth::{AdminCredentials, AdminToken, AUTH_TOKEN_COOKIE};
