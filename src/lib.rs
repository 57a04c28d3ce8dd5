//! # Doc Analytics
//!
//! Command-line client for a document-analytics service: upload PDF and
//! DOCX files, browse the library, search with per-document match
//! navigation, classify everything, and read aggregate statistics.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────────┐   ┌──────────────┐
//! │  dax CLI /   │──▶│     Coordinator      │──▶│ HttpBackend  │──▶ backend API
//! │  dax shell   │   │ repository · session │   │  (reqwest)   │
//! └──────────────┘   │ statistics · gates   │   └──────────────┘
//!                    └──────────────────────┘
//! ```
//!
//! The state machine lives in `doc-analytics-core`; this crate adds the
//! transport, configuration, logging, and terminal rendering.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`http`] | `reqwest` implementation of the backend trait |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`render`] | Plain-text rendering |
//! | [`shell`] | Interactive `dax shell` loop |

pub mod config;
pub mod http;
pub mod logging;
pub mod render;
pub mod shell;
