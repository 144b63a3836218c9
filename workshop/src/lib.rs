//! Gift workshop service: a four-stage agent pipeline (photo, profile, gift
//! matching, narration) behind an HTTP API that streams progress over SSE.

pub mod agents;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod services;
