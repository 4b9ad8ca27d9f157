//! Backend boundary: the `Backend` trait and its two implementations.
//!
//! - `RestClient` talks to the hosted table and auth APIs
//! - `MemoryBackend` keeps rows in process, for tests and demo mode

mod backend;
mod client;
mod error;
mod memory;
mod query;

pub use backend::{AuthTokens, AuthUser, Backend};
pub use client::RestClient;
pub use error::{ApiError, UNIQUE_VIOLATION_CODE};
pub use memory::MemoryBackend;
pub use query::{Direction, Filter, Order, Query};
