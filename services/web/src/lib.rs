pub mod adapters;
pub mod config;
pub mod error;
pub mod templates;
pub mod web;
