//! `mwi-core` — shared entity types, error kinds, environment configuration,
//! and data-directory resolution for the MyWebIntelligence crawl engine.
//!
//! # Architecture
//!
//! ```text
//! Fetcher ──► Content Pipeline ──► Relevance Gate ──► Relevance ──► Store
//!                    │                                                │
//!                    └──────────────► Media / Link discovery ◄────────┘
//! ```
//!
//! Every other crate in this workspace depends on `mwi-core` for the
//! [`Land`], [`Expression`], [`Media`] family of types and the shared
//! [`Error`].

pub mod config;
pub mod error;
pub mod models;
pub mod paths;

pub use config::Config;
pub use error::{Error, Result};
pub use models::{
    Domain, DominantColor, Expression, ExpressionLink, Land, LandDictionaryEntry, Media,
    MediaKind, Tag, TaggedContent, Word,
};
