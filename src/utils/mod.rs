// Utility functions
pub mod error;
pub mod mailer;

pub use error::*;
