//! Utility modules for ws-fetch
//!
//! - `files`: run directory layout and catalog writing
//! - `images`: bounded image downloading
//! - `http`: HTTP client utilities

pub mod files;
pub mod http;
pub mod images;
