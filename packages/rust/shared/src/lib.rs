//! Shared types, error model, and configuration for ExpertDesk.
//!
//! This crate is the foundation depended on by all other ExpertDesk crates.
//! It provides:
//! - [`ExpertDeskError`]: the unified error type
//! - Raw backend records ([`ExpertRecord`], [`CareerRecord`], [`ProjectRecord`],
//!   [`MembershipRecord`]) and the denormalized [`ExpertView`]
//! - Configuration ([`AppConfig`], [`FetchConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiConfig, AppConfig, FetchConfig, ViewConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, resolve_auth_token,
};
pub use error::{ExpertDeskError, Result};
pub use types::{
    CareerEntry, CareerRecord, ExpertId, ExpertRecord, ExpertView, MembershipRecord, ProjectId,
    ProjectRecord, RawSnapshot, Resource,
};
