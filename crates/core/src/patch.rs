//! Tagged per-entity patch types.
//!
//! Each patch enumerates exactly the mutable fields of its entity. `None`
//! leaves a field untouched; array fields, when present, fully replace the
//! prior array (never partially merged). Clearable scalar fields use a
//! nested `Option`: `Some(None)` clears, `Some(Some(v))` sets.

use crate::knowledge::{FileAttachment, Folder, Item, Section};
use crate::workspace::WorkspaceSettings;

/// Mutable fields of a [`Folder`](crate::knowledge::Folder).
#[derive(Debug, Clone, Default)]
pub struct FolderPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Wholesale replacement of the materialized item snapshots
    pub items: Option<Vec<Item>>,
    /// Wholesale replacement of the subfolder snapshots
    pub subfolders: Option<Vec<Folder>>,
}

/// Mutable fields of an [`Item`](crate::knowledge::Item).
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Primary folder membership; `Some(None)` clears it
    pub folder_id: Option<Option<String>>,
    /// Full membership set; the store diffs this against the previous set
    /// and reconciles folder back-references
    pub folder_ids: Option<Vec<String>>,
    /// Basin membership; `Some(None)` clears it
    pub basin_id: Option<Option<String>>,
    pub sections: Option<Vec<Section>>,
    pub files: Option<Vec<FileAttachment>>,
}

/// Mutable fields of a [`Basin`](crate::knowledge::Basin).
#[derive(Debug, Clone, Default)]
pub struct BasinPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Wholesale replacement of the materialized item snapshots
    pub items: Option<Vec<Item>>,
}

/// Mutable fields of a [`Workspace`](crate::workspace::Workspace).
#[derive(Debug, Clone, Default)]
pub struct WorkspacePatch {
    pub name: Option<String>,
    pub settings: Option<WorkspaceSettings>,
    pub linked_knowledge: Option<Vec<String>>,
    pub knowledge_in_context: Option<Vec<String>>,
}
