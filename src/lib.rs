//! PropertyPulse - property listing service
//!
//! Owners submit listings (fields plus images hosted on an external asset
//! host) and remove their own listings. All modules are public so the
//! integration tests can drive them directly.

pub mod assets;
pub mod cache;
pub mod entities;
pub mod errors;
pub mod form;
pub mod identity;
pub mod listing;
pub mod profile;
pub mod session;
pub mod settings;
pub mod storage;
pub mod web;
