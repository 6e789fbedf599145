//! outline-sync: bridges outliner trees and flat annotated documents.
//!
//! An outliner page is a tree of nodes whose text carries inline markup. Peers
//! that do not understand trees exchange a flat document instead: plain
//! content plus a list of range annotations. This crate provides:
//!
//! - **Core model** - outline nodes, flattening, annotations and documents
//! - **Markup codec** - inline markup to annotations and back
//! - **Conversion** - tree to document, and reconciliation of a live tree
//!   against a received document through a host interface
//! - **Session** - per-workspace orchestration with a process-wide store of
//!   last known documents (optional)
//!
//! # Quick Start
//!
//! ```rust
//! use outline_sync::core::{OutlineNode, ViewType};
//! use outline_sync::sync::to_document;
//!
//! let nodes = vec![OutlineNode::new("a", "**hello**")
//!     .with_children(vec![OutlineNode::new("b", "world")])];
//! let doc = to_document(&nodes, ViewType::Bullet);
//! assert_eq!(doc.content, "helloworld");
//! ```
//!
//! # Features
//!
//! - `storage` - Enables the process-wide document store and [`session`]
//! - `cli` - Builds the `outline-sync` binary (requires `storage`)

// Outline tree, flattening, and annotated documents
pub mod core;

// Inline markup codec
pub mod doc;

// Forward conversion and reconciliation
pub mod sync;

pub mod config;

// Optional: process-wide document store
#[cfg(feature = "storage")]
pub mod storage;

// Optional: workspace sessions
#[cfg(feature = "storage")]
pub mod session;

// Re-export core types
pub use core::{FlatEntry, NodeId, OutlineNode, OutlineTree, ViewType, flatten};

// Re-export annotation types
pub use core::mark::{Annotation, AnnotationType, Attributes, Document, Violation};

// Re-export codec
pub use doc::{BoundaryRule, Parsed, parse, serialize, serialize_with_rule};

// Re-export sync types
pub use sync::{
    ExpectedBlock, HostError, MemoryHost, Mutation, OutlineHost, ReconcileError,
    ReconcileReport, apply_document, expected_blocks, to_document, tree_to_document,
};

pub use config::{ConfigError, SyncConfig};

// Re-export storage and session types (feature-gated)
#[cfg(feature = "storage")]
pub use session::{Session, SessionError};
#[cfg(feature = "storage")]
pub use storage::{DocumentStore, StoreError, store};
