//! Folder, item, and basin CRUD.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use tidepool_core::knowledge::{Basin, FileAttachment, Folder, Item, Section};
use tidepool_core::patch::{BasinPatch, FolderPatch, ItemPatch};
use tidepool_persistence::{StateStore, keys, load_collection, save_collection};

/// The canonical knowledge state: flat collections plus the injected flat
/// store they write through to.
pub struct KnowledgeStore {
    pub(crate) folders: Vec<Folder>,
    pub(crate) items: Vec<Item>,
    pub(crate) basins: Vec<Basin>,
    state: Arc<dyn StateStore>,
}

impl KnowledgeStore {
    /// Load all knowledge collections from the flat store. Missing or
    /// corrupt collections start empty.
    pub fn load(state: Arc<dyn StateStore>) -> Self {
        let folders: Vec<Folder> = load_collection(state.as_ref(), keys::FOLDERS);
        let items: Vec<Item> = load_collection(state.as_ref(), keys::ITEMS);
        let basins: Vec<Basin> = load_collection(state.as_ref(), keys::BASINS);
        debug!(
            folders = folders.len(),
            items = items.len(),
            basins = basins.len(),
            "Knowledge store loaded"
        );
        Self {
            folders,
            items,
            basins,
            state,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn basins(&self) -> &[Basin] {
        &self.basins
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn basin(&self, id: &str) -> Option<&Basin> {
        self.basins.iter().find(|b| b.id == id)
    }

    /// Items whose **primary** membership is `folder_id` — the view context
    /// assembly expands.
    pub fn items_in_folder(&self, folder_id: &str) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|i| i.folder_id.as_deref() == Some(folder_id))
            .collect()
    }

    // ── Folder CRUD ───────────────────────────────────────────────────────

    /// Create a folder, resolving `item_ids` into its materialized `items`
    /// and registering the folder in each resolved item's `folder_ids`.
    /// A `parent_folder_id` that resolves nests the new folder under it;
    /// one that does not resolve leaves the folder at the root.
    pub fn create_folder(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        item_ids: &[String],
        parent_folder_id: Option<&str>,
    ) -> Folder {
        let mut folder = Folder::new(name, description);

        for id in item_ids {
            let Some(item) = self.items.iter_mut().find(|i| &i.id == id) else {
                continue;
            };
            if !item.folder_ids.contains(&folder.id) {
                item.folder_ids.push(folder.id.clone());
                item.updated_at = Utc::now();
            }
            folder.items.push(item.clone());
        }

        if let Some(parent_id) = parent_folder_id {
            if self.folders.iter().any(|f| f.id == parent_id) {
                folder.parent_folder_id = Some(parent_id.to_string());
            } else {
                warn!(parent_id, "Parent folder did not resolve, creating at root");
            }
        }

        self.folders.push(folder.clone());
        if let Some(parent_id) = folder.parent_folder_id.clone() {
            self.attach_to_parent(&parent_id, &folder.id);
        }

        debug!(folder_id = %folder.id, items = folder.items.len(), "Created folder");
        self.persist_folders();
        self.persist_items();
        folder
    }

    /// Merge a patch into a folder. `items`/`subfolders`, when present,
    /// fully replace the prior arrays. Always refreshes `updated_at` — an
    /// empty patch changes nothing else.
    pub fn update_folder(&mut self, id: &str, patch: FolderPatch) -> Option<Folder> {
        let folder = self.folders.iter_mut().find(|f| f.id == id)?;
        if let Some(name) = patch.name {
            folder.name = name;
        }
        if let Some(description) = patch.description {
            folder.description = description;
        }
        if let Some(items) = patch.items {
            folder.items = items;
        }
        if let Some(subfolders) = patch.subfolders {
            folder.subfolders = subfolders;
        }
        folder.updated_at = Utc::now();
        let updated = folder.clone();

        self.refresh_ancestor_snapshots(id);
        self.persist_folders();
        Some(updated)
    }

    /// Delete a folder, detaching it from its parent's `subfolders`.
    ///
    /// Deliberately non-cascading: descendant subfolders keep their (now
    /// dangling) `parent_folder_id` and items keep the dead ID in
    /// `folder_ids`; every resolution path tolerates dangling IDs.
    pub fn delete_folder(&mut self, id: &str) -> bool {
        let Some(position) = self.folders.iter().position(|f| f.id == id) else {
            return false;
        };
        let folder = self.folders.remove(position);

        if let Some(parent_id) = folder.parent_folder_id.clone() {
            if let Some(parent) = self.folders.iter_mut().find(|f| f.id == parent_id) {
                parent.subfolders.retain(|s| s.id != folder.id);
                parent.updated_at = Utc::now();
                self.refresh_ancestor_snapshots(&parent_id);
            }
        }

        debug!(folder_id = id, "Deleted folder");
        self.persist_folders();
        true
    }

    // ── Item CRUD ─────────────────────────────────────────────────────────

    /// Create an item, assigning IDs to any section or file missing one.
    /// When `folder_id` resolves, the constructed item is registered into
    /// that folder by value within this same call.
    pub fn create_item(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
        folder_id: Option<&str>,
        sections: Vec<Section>,
        files: Vec<FileAttachment>,
    ) -> Item {
        let mut item = Item::new(title, content);
        item.sections = sections;
        item.files = files;
        normalize_attachments(&mut item);

        if let Some(folder_id) = folder_id {
            if self.folders.iter().any(|f| f.id == folder_id) {
                item.folder_id = Some(folder_id.to_string());
                item.folder_ids.push(folder_id.to_string());
            } else {
                warn!(folder_id, "Folder did not resolve, creating unfiled item");
            }
        }

        self.items.push(item.clone());
        if let Some(folder_id) = item.folder_id.clone() {
            self.insert_item_snapshot(&folder_id, &item);
        }

        debug!(item_id = %item.id, folder = ?item.folder_id, "Created knowledge item");
        self.persist_items();
        self.persist_folders();
        item
    }

    /// Merge a patch into an item, reconciling folder and basin membership
    /// against the previous state: folders the item left lose its snapshot,
    /// folders it joined gain one (duplicate-guarded), and a set primary
    /// `folder_id` is normalized into `folder_ids`.
    pub fn update_item(&mut self, id: &str, patch: ItemPatch) -> Option<Item> {
        let index = self.items.iter().position(|i| i.id == id)?;
        let prev_folder_ids = self.items[index].folder_ids.clone();
        let prev_basin_id = self.items[index].basin_id.clone();

        {
            let item = &mut self.items[index];
            if let Some(title) = patch.title {
                item.title = title;
            }
            if let Some(content) = patch.content {
                item.content = content;
            }
            if let Some(folder_id) = patch.folder_id {
                item.folder_id = folder_id;
            }
            if let Some(folder_ids) = patch.folder_ids {
                item.folder_ids = folder_ids;
            }
            if let Some(basin_id) = patch.basin_id {
                item.basin_id = basin_id;
            }
            if let Some(sections) = patch.sections {
                item.sections = sections;
            }
            if let Some(files) = patch.files {
                item.files = files;
            }
            // Invariant: a set primary membership is always part of folder_ids.
            if let Some(primary) = item.folder_id.clone() {
                if !item.folder_ids.contains(&primary) {
                    item.folder_ids.push(primary);
                }
            }
            item.updated_at = Utc::now();
        }
        normalize_attachments(&mut self.items[index]);
        let item = self.items[index].clone();

        for removed in prev_folder_ids
            .iter()
            .filter(|f| !item.folder_ids.contains(*f))
            .cloned()
            .collect::<Vec<_>>()
        {
            self.remove_item_snapshot(&removed, &item.id);
        }
        for added in item
            .folder_ids
            .iter()
            .filter(|f| !prev_folder_ids.contains(*f))
            .cloned()
            .collect::<Vec<_>>()
        {
            self.insert_item_snapshot(&added, &item);
        }
        self.refresh_item_snapshots(&item);

        if prev_basin_id != item.basin_id {
            if let Some(prev) = prev_basin_id {
                self.remove_basin_snapshot(&prev, &item.id);
            }
            if let Some(next) = item.basin_id.clone() {
                self.insert_basin_snapshot(&next, &item);
            }
        }

        self.persist_items();
        self.persist_folders();
        self.persist_basins();
        Some(item)
    }

    /// Delete an item globally and scrub it from every folder's and basin's
    /// materialized `items`.
    pub fn delete_item(&mut self, id: &str) -> bool {
        let Some(position) = self.items.iter().position(|i| i.id == id) else {
            return false;
        };
        self.items.remove(position);

        let mut touched: Vec<String> = Vec::new();
        for folder in self.folders.iter_mut() {
            let before = folder.items.len();
            folder.items.retain(|s| s.id != id);
            if folder.items.len() < before {
                folder.updated_at = Utc::now();
                touched.push(folder.id.clone());
            }
        }
        for folder_id in touched {
            self.refresh_ancestor_snapshots(&folder_id);
        }
        for basin in self.basins.iter_mut() {
            let before = basin.items.len();
            basin.items.retain(|s| s.id != id);
            if basin.items.len() < before {
                basin.updated_at = Utc::now();
            }
        }

        debug!(item_id = id, "Deleted knowledge item");
        self.persist_items();
        self.persist_folders();
        self.persist_basins();
        true
    }

    // ── Basin CRUD ────────────────────────────────────────────────────────

    /// Create a basin, resolving `item_ids` into its materialized `items`
    /// and re-pointing each resolved item's `basin_id` (an item belongs to
    /// at most one basin; the previous basin loses the snapshot).
    pub fn create_basin(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        item_ids: &[String],
    ) -> Basin {
        let mut basin = Basin::new(name, description);

        for id in item_ids {
            let (snapshot, previous) = {
                let Some(item) = self.items.iter_mut().find(|i| &i.id == id) else {
                    continue;
                };
                let previous = item.basin_id.replace(basin.id.clone());
                item.updated_at = Utc::now();
                (item.clone(), previous)
            };
            if let Some(prev_id) = previous {
                self.remove_basin_snapshot(&prev_id, &snapshot.id);
            }
            self.refresh_item_snapshots(&snapshot);
            basin.items.push(snapshot);
        }

        self.basins.push(basin.clone());
        debug!(basin_id = %basin.id, items = basin.items.len(), "Created basin");
        self.persist_basins();
        self.persist_items();
        self.persist_folders();
        basin
    }

    /// Merge a patch into a basin. `items`, when present, fully replaces the
    /// prior array. Always refreshes `updated_at`.
    pub fn update_basin(&mut self, id: &str, patch: BasinPatch) -> Option<Basin> {
        let basin = self.basins.iter_mut().find(|b| b.id == id)?;
        if let Some(name) = patch.name {
            basin.name = name;
        }
        if let Some(description) = patch.description {
            basin.description = description;
        }
        if let Some(items) = patch.items {
            basin.items = items;
        }
        basin.updated_at = Utc::now();
        let updated = basin.clone();

        self.persist_basins();
        Some(updated)
    }

    /// Delete a basin. Mirrors the folder semantics: member items keep
    /// their (now dangling) `basin_id`.
    pub fn delete_basin(&mut self, id: &str) -> bool {
        let before = self.basins.len();
        self.basins.retain(|b| b.id != id);
        let deleted = self.basins.len() < before;
        if deleted {
            debug!(basin_id = id, "Deleted basin");
            self.persist_basins();
        }
        deleted
    }

    // ── Snapshot reconciliation ───────────────────────────────────────────

    /// Push a snapshot of `child_id` into the parent's `subfolders` when not
    /// already present.
    pub(crate) fn attach_to_parent(&mut self, parent_id: &str, child_id: &str) {
        let Some(child) = self.folder(child_id).cloned() else {
            return;
        };
        if let Some(parent) = self.folders.iter_mut().find(|f| f.id == parent_id) {
            if !parent.subfolders.iter().any(|s| s.id == child.id) {
                parent.subfolders.push(child);
                parent.updated_at = Utc::now();
            }
        }
        self.refresh_ancestor_snapshots(parent_id);
    }

    /// Re-seat the canonical version of `folder_id` into each ancestor's
    /// `subfolders`, walking up the parent chain. Guarded against cycles in
    /// loaded data.
    pub(crate) fn refresh_ancestor_snapshots(&mut self, folder_id: &str) {
        let mut seen = std::collections::HashSet::new();
        let mut child_id = folder_id.to_string();
        while seen.insert(child_id.clone()) {
            let Some(child) = self.folder(&child_id).cloned() else {
                break;
            };
            let Some(parent_id) = child.parent_folder_id.clone() else {
                break;
            };
            let Some(parent) = self.folders.iter_mut().find(|f| f.id == parent_id) else {
                break;
            };
            match parent.subfolders.iter_mut().find(|s| s.id == child.id) {
                Some(slot) => *slot = child,
                None => break,
            }
            child_id = parent_id;
        }
    }

    fn insert_item_snapshot(&mut self, folder_id: &str, item: &Item) {
        let Some(folder) = self.folders.iter_mut().find(|f| f.id == folder_id) else {
            return;
        };
        if !folder.items.iter().any(|s| s.id == item.id) {
            folder.items.push(item.clone());
            folder.updated_at = Utc::now();
        }
        self.refresh_ancestor_snapshots(folder_id);
    }

    fn remove_item_snapshot(&mut self, folder_id: &str, item_id: &str) {
        let Some(folder) = self.folders.iter_mut().find(|f| f.id == folder_id) else {
            return;
        };
        let before = folder.items.len();
        folder.items.retain(|s| s.id != item_id);
        if folder.items.len() < before {
            folder.updated_at = Utc::now();
        }
        self.refresh_ancestor_snapshots(folder_id);
    }

    /// Refresh the stale copies of `item` held by folders and basins that
    /// retain it.
    fn refresh_item_snapshots(&mut self, item: &Item) {
        let mut touched: Vec<String> = Vec::new();
        for folder in self.folders.iter_mut() {
            if let Some(slot) = folder.items.iter_mut().find(|s| s.id == item.id) {
                *slot = item.clone();
                touched.push(folder.id.clone());
            }
        }
        for folder_id in touched {
            self.refresh_ancestor_snapshots(&folder_id);
        }
        for basin in self.basins.iter_mut() {
            if let Some(slot) = basin.items.iter_mut().find(|s| s.id == item.id) {
                *slot = item.clone();
            }
        }
    }

    fn insert_basin_snapshot(&mut self, basin_id: &str, item: &Item) {
        let Some(basin) = self.basins.iter_mut().find(|b| b.id == basin_id) else {
            return;
        };
        if !basin.items.iter().any(|s| s.id == item.id) {
            basin.items.push(item.clone());
            basin.updated_at = Utc::now();
        }
    }

    fn remove_basin_snapshot(&mut self, basin_id: &str, item_id: &str) {
        let Some(basin) = self.basins.iter_mut().find(|b| b.id == basin_id) else {
            return;
        };
        let before = basin.items.len();
        basin.items.retain(|s| s.id != item_id);
        if basin.items.len() < before {
            basin.updated_at = Utc::now();
        }
    }

    // ── Persistence ───────────────────────────────────────────────────────

    pub(crate) fn persist_folders(&self) {
        if let Err(e) = save_collection(self.state.as_ref(), keys::FOLDERS, &self.folders) {
            error!(error = %e, "Failed to persist folders");
        }
    }

    fn persist_items(&self) {
        if let Err(e) = save_collection(self.state.as_ref(), keys::ITEMS, &self.items) {
            error!(error = %e, "Failed to persist items");
        }
    }

    fn persist_basins(&self) {
        if let Err(e) = save_collection(self.state.as_ref(), keys::BASINS, &self.basins) {
            error!(error = %e, "Failed to persist basins");
        }
    }
}

/// Assign IDs to sections and files missing them and point them at their
/// owning item.
fn normalize_attachments(item: &mut Item) {
    for section in &mut item.sections {
        if section.id.is_empty() {
            section.id = Uuid::new_v4().to_string();
        }
        section.item_id = item.id.clone();
    }
    for file in &mut item.files {
        if file.id.is_empty() {
            file.id = Uuid::new_v4().to_string();
        }
        file.item_id = item.id.clone();
    }
}
