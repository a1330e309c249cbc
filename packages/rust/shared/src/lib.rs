//! Shared types, error model, and configuration for pageguide.
//!
//! This crate is the foundation depended on by all other pageguide crates.
//! It provides:
//! - [`GuidanceError`]: the unified error type
//! - Domain types ([`Artefact`], [`ScopeId`], [`SearchPayload`], [`Notification`])
//! - Configuration ([`AppConfig`], [`GuidanceOptions`], config loading)
//! - Collaborator traits ([`SearchGateway`], [`LiveService`])

pub mod config;
pub mod error;
pub mod gateway;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BridgeConfig, GuidanceConfig, GuidanceOptions, UserConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, username_from_email,
};
pub use error::{GuidanceError, Result};
pub use gateway::{LiveService, SearchGateway};
pub use types::{
    Artefact, ArtefactMetaData, ContentLine, ContentNode, DocumentHit, DocumentSearchResponse,
    Notification, ScopeId, ScopeValues, SearchPayload, SearchResponse, Severity,
};
