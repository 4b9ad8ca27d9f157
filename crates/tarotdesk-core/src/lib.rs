//! Core library for tarotdesk.
//!
//! Backend access (hosted REST or in-memory), the data models, per-entity
//! services with their validation rules, session handling, the local cache,
//! and the logic behind the public pages (digital reading lookup, video
//! embeds, contact and booking requests).

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod contact;
pub mod demo;
pub mod media;
pub mod models;
pub mod readings;
pub mod services;
pub mod utils;

pub use api::{ApiError, Backend, MemoryBackend, RestClient};
pub use config::Config;
pub use services::{ServiceError, ServiceResult, Services};
