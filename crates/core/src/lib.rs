//! # Tidepool Core
//!
//! Domain types, traits, and error definitions for the Tidepool knowledge
//! engine. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! External services (completion, extraction, search) are defined as traits
//! here; implementations live outside the core. Entity state is owned by the
//! store crates and mutated through tagged patch types, so every mutable
//! field is enumerated in one place.

pub mod collaborator;
pub mod error;
pub mod knowledge;
pub mod message;
pub mod patch;
pub mod timestamp;
pub mod workspace;

// Re-export key types at crate root for ergonomics
pub use collaborator::{
    CompletionProvider, CompletionRequest, ContentExtractor, ExtractedContent, ExtractionSource,
    PromptTurn, SearchHit, SearchOptions, SearchProvider,
};
pub use error::{
    Error, ExternalServiceError, PersistenceError, ReferenceError, Result, ValidationError,
};
pub use knowledge::{Basin, FileAttachment, Folder, Item, Section};
pub use message::{Message, Role};
pub use patch::{BasinPatch, FolderPatch, ItemPatch, WorkspacePatch};
pub use workspace::{Thread, Workspace, WorkspaceSettings};
