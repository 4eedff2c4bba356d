//! tubesync reconciles YouTube video metadata into a pair of Notion
//! databases: one page per video, one page per channel, with each video
//! page holding a relation to its channel page. Runs are idempotent;
//! existing pages are only rewritten when a compared field actually
//! changed.

pub mod cli;
pub mod config;
pub mod model;
pub mod normalization;
pub mod providers;
pub mod sync;
pub mod tracing;

pub mod util {
    pub mod env;
}

pub use config::SyncConfig;
pub use model::{Channel, PageRef, UpsertOutcome, Video};
pub use sync::orchestrator::{SyncEngine, SyncSummary};
