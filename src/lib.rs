pub mod auth;
pub mod client;
pub mod config;
pub mod humanize;
pub mod ingest;
pub mod observability;
pub mod report;
pub mod storage;
