//! Video upload intake service
//!
//! Accepts video uploads, records them in PostgreSQL, stores the bytes in
//! S3-compatible object storage and queues a processing message on Redis
//! for the external worker fleet. Finished videos are served through
//! signed download links.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
