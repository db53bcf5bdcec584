// Library exports for the photo-sharing server.
// Integration tests drive the router through these modules.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
pub mod store;
pub mod uploads;
