//! Email Triage: classify inbound emails and draft replies.

pub mod config;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod pipeline;
pub mod server;
