//! Authentication module for managing backend sessions and credentials.
//!
//! This module provides:
//! - `Session`: Token-based session persisted to the cache directory
//! - `AuthGate`: Establishes a session before admin data is loaded
//! - `CredentialStore`: Secure OS-level credential storage via keyring

pub mod credentials;
pub mod gate;
pub mod session;

pub use credentials::CredentialStore;
pub use gate::{AuthGate, AuthState};
pub use session::{Session, SessionData};
