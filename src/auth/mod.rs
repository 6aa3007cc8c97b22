//! # Auth Module
//!
//! Credential and Google sign-in on top of persisted sessions:
//! - signup, email verification, login and password reset flows
//! - short-lived access JWTs and refresh JWTs bound to a session row
//! - refresh with rotation near session expiry, logout and session revocation
//! - `AuthedUser` extractor for protected routes

pub mod cleanup;
pub mod cookies;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod password;
pub mod routes;
pub mod service;
pub mod tokens;
pub mod validators;


pub use extractors::AuthedUser;
pub use routes::auth_routes;
pub use service::AuthService;
