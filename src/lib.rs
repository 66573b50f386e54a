//! # PhD Summary
//!
//! A small document service for PhD summaries. Each chapter is one
//! document holding ordered subsections, each with ordered findings and
//! their supporting authors, plus free-text tags and an optional image.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────────┐   ┌──────────────┐
//! │   HTTP   │──▶│ ChapterService │──▶│  dyn Store   │
//! │  (Axum)  │   │ normalize +    │   │ SQLite / mem │
//! └────┬─────┘   │ timeouts       │   └──────────────┘
//!      │         └────────────────┘
//!      ▼                 ▲
//! ┌──────────┐      ┌────┴─────┐
//! │  images/ │      │   CLI    │
//! │ uploads  │      │ (get,..) │
//! └──────────┘      └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Idempotent schema creation |
//! | [`sqlite_store`] | SQLite implementation of the chapter [`store::Store`] |
//! | [`chapters`] | `ChapterService`: tag normalization, timeouts, CLI entry points |
//! | [`uploads`] | Image file storage for `POST /upload` |
//! | [`server`] | HTTP server (Axum) with CORS and static image serving |
//!
//! ## Configuration
//!
//! The service is configured via a TOML file (default:
//! `config/phd-summary.toml`). See [`config::load_config`] for the
//! validation rules.

pub mod chapters;
pub mod config;
pub mod db;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
pub mod uploads;

pub use phd_summary_core::{models, store};
pub use chapters::{ChapterError, ChapterService};
