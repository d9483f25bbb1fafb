//! OAuth2 client-credentials models: credentials, redacted secrets, and bearer tokens.

pub mod credentials;
pub mod secret;
pub mod token;

pub use credentials::*;
pub use secret::*;
pub use token::*;
