//! # Doc Analytics Core
//!
//! Client-side state for the document-analytics service: data models, the
//! backend trait, the cached document library, the search session with its
//! per-result match navigators, the statistics view, and the coordinator
//! that sequences overlapping backend calls against them.
//!
//! This crate contains no tokio, reqwest, or filesystem I/O. The HTTP
//! backend and the command-line surface live in the `doc-analytics` crate.
//!
//! ## Consistency model
//!
//! Each state holder tags its requests with a ticket from its own
//! [`sequence::SequenceGate`]. Only the response to the most recently issued
//! request is applied; an older response that arrives late is discarded.
//! Failures never leave a holder partially updated.

pub mod backend;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod navigator;
pub mod repository;
pub mod sequence;
pub mod session;
pub mod statistics;

pub use backend::Backend;
pub use coordinator::{ApiStatus, Coordinator, Outcome, WorkspaceSnapshot};
pub use error::{ClientError, Notice, NoticeLevel, Operation};
