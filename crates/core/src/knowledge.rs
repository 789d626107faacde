//! Knowledge graph entities: folders, items, sections, files, basins.
//!
//! Folders form a tree (single parent per folder) and carry materialized
//! snapshots of their items and subfolders — the same denormalized shape the
//! flat store persists. The canonical state lives in the store's flat
//! collections; snapshots are reconciled inside the same mutation that
//! changes their source of truth.
//!
//! Serialized field names follow the persisted layout of the original
//! runtime (`camelCase`, `createdAt`/`updatedAt` as ISO-8601 strings).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timestamp;

/// A hierarchical named container of items and optional subfolders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Unique folder ID
    pub id: String,

    /// Display name
    pub name: String,

    /// Free-form description, injected alongside the name during context
    /// assembly
    pub description: String,

    /// Materialized snapshots of member items
    #[serde(default)]
    pub items: Vec<Item>,

    /// Parent folder, if nested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_folder_id: Option<String>,

    /// Materialized snapshots of child folders
    #[serde(default)]
    pub subfolders: Vec<Folder>,

    #[serde(default = "chrono::Utc::now", with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "chrono::Utc::now", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Create an empty folder with a fresh ID and timestamps.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            items: Vec::new(),
            parent_folder_id: None,
            subfolders: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// An atomic note with content, optional sections and files, filed under
/// zero or more folders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique item ID
    pub id: String,

    /// Display title
    pub title: String,

    /// Main body text
    pub content: String,

    /// Primary folder membership. Invariant: when set, the ID is also a
    /// member of `folder_ids`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,

    /// All folder memberships, superset of `folder_id`
    #[serde(default)]
    pub folder_ids: Vec<String>,

    /// Basin membership, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basin_id: Option<String>,

    /// Ordered sub-blocks of the item
    #[serde(default)]
    pub sections: Vec<Section>,

    /// Attached files with optional extracted text
    #[serde(default)]
    pub files: Vec<FileAttachment>,

    #[serde(default = "chrono::Utc::now", with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "chrono::Utc::now", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Create an item with no memberships, sections, or files.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            folder_id: None,
            folder_ids: Vec::new(),
            basin_id: None,
            sections: Vec::new(),
            files: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A titled sub-block of an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Unique section ID; assigned by the store when missing
    #[serde(default)]
    pub id: String,

    /// Owning item
    #[serde(default)]
    pub item_id: String,

    pub title: String,

    pub content: String,

    /// Embedding vector, when computed by the extraction collaborator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<f32>>,
}

/// A file attached to an item. `content` holds extracted text, when the
/// extraction collaborator produced any.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    /// Unique file ID; assigned by the store when missing
    #[serde(default)]
    pub id: String,

    /// Owning item
    #[serde(default)]
    pub item_id: String,

    /// Original filename
    pub name: String,

    /// Source URL or object reference
    pub url: String,

    /// MIME type
    #[serde(rename = "type")]
    pub media_type: String,

    /// Size in bytes
    #[serde(default)]
    pub size: u64,

    /// Extracted text, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Embedding vector, when computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<f32>>,
}

/// A flat, non-hierarchical item grouping independent of the folder tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Basin {
    /// Unique basin ID
    pub id: String,

    pub name: String,

    pub description: String,

    /// Materialized snapshots of member items
    #[serde(default)]
    pub items: Vec<Item>,

    #[serde(default = "chrono::Utc::now", with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "chrono::Utc::now", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Basin {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
