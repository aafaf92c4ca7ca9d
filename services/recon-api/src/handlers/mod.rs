//! HTTP request handlers for the reconstruction API.

pub mod download;
pub mod health;
pub mod reconstruct;
