//! HTTP request handlers, one module per resource

pub mod chat;
pub mod files;
pub mod health;
pub mod ingest;
pub mod repos;
