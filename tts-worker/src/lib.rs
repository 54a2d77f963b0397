//! tts-worker: serverless text-to-speech job handler.
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
