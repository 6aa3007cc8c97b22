// src/services/mod.rs
//
// Outbound collaborators used by the auth flows

pub mod email;
pub mod google;
pub mod mail;

// Re-export commonly used types for convenience
pub use google::{GoogleProfile, GoogleService};
pub use mail::{MailError, MailMessage, Mailer};
