//! Folder hierarchy operations: parent/child linking, descendant
//! computation, parent-candidate filtering, and tree presentation.
//!
//! Parentage is the source of truth (`parent_folder_id` on the child); the
//! parent's `subfolders` snapshot is the denormalized side and is updated in
//! the same mutation. Cycle avoidance happens at the candidate-filtering
//! layer: a folder and its descendants are never offered as its new parent.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::warn;

use crate::knowledge::KnowledgeStore;
use tidepool_core::knowledge::Folder;

/// One row of the depth-first folder tree presentation.
#[derive(Debug, Clone)]
pub struct FolderTreeNode<'a> {
    pub folder: &'a Folder,
    pub depth: usize,
}

impl KnowledgeStore {
    /// Nest `child_id` under `parent_id`: sets the child's
    /// `parent_folder_id` and inserts a snapshot into the parent's
    /// `subfolders` when not already present. IDs that do not resolve make
    /// the call a no-op.
    pub fn add_folder_to_folder(&mut self, parent_id: &str, child_id: &str) {
        if parent_id == child_id {
            warn!(folder_id = parent_id, "Refusing to nest a folder under itself");
            return;
        }
        if self.folder(parent_id).is_none() || self.folder(child_id).is_none() {
            return;
        }

        if let Some(child) = self.folders.iter_mut().find(|f| f.id == child_id) {
            child.parent_folder_id = Some(parent_id.to_string());
            child.updated_at = Utc::now();
        }
        self.attach_to_parent(parent_id, child_id);
        self.refresh_ancestor_snapshots(child_id);
        self.persist_folders();
    }

    /// Detach `child_id` from `parent_id`: removes the child from the
    /// parent's `subfolders`; clears the child's `parent_folder_id` only
    /// when it currently points at this parent.
    pub fn remove_folder_from_folder(&mut self, parent_id: &str, child_id: &str) {
        if let Some(parent) = self.folders.iter_mut().find(|f| f.id == parent_id) {
            let before = parent.subfolders.len();
            parent.subfolders.retain(|s| s.id != child_id);
            if parent.subfolders.len() < before {
                parent.updated_at = Utc::now();
            }
        }
        if let Some(child) = self.folders.iter_mut().find(|f| f.id == child_id) {
            if child.parent_folder_id.as_deref() == Some(parent_id) {
                child.parent_folder_id = None;
                child.updated_at = Utc::now();
            }
        }
        self.refresh_ancestor_snapshots(parent_id);
        self.persist_folders();
    }

    /// All transitive children of `folder_id`, computed over the
    /// parent-keyed adjacency of the flat collection. Correct for arbitrary
    /// depth, never contains the starting folder, and terminates even if
    /// loaded data contains a parent cycle.
    pub fn descendants_of(&self, folder_id: &str) -> HashSet<String> {
        let mut children_by_parent: HashMap<&str, Vec<&str>> = HashMap::new();
        for folder in &self.folders {
            if let Some(parent_id) = folder.parent_folder_id.as_deref() {
                children_by_parent
                    .entry(parent_id)
                    .or_default()
                    .push(&folder.id);
            }
        }

        let mut descendants = HashSet::new();
        let mut stack: Vec<&str> = children_by_parent
            .get(folder_id)
            .cloned()
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            if id == folder_id || !descendants.insert(id.to_string()) {
                continue;
            }
            if let Some(children) = children_by_parent.get(id) {
                stack.extend(children);
            }
        }
        descendants
    }

    /// Folders eligible to become `folder_id`'s new parent: everything
    /// except the folder itself and its descendants.
    pub fn parent_candidates(&self, folder_id: &str) -> Vec<&Folder> {
        let excluded = self.descendants_of(folder_id);
        self.folders
            .iter()
            .filter(|f| f.id != folder_id && !excluded.contains(&f.id))
            .collect()
    }

    /// Depth-first presentation order, grouped by `parent_folder_id` in
    /// array (insertion) order. No sorting. A folder whose parent no longer
    /// resolves renders as a root.
    pub fn folder_tree(&self) -> Vec<FolderTreeNode<'_>> {
        let ids: HashSet<&str> = self.folders.iter().map(|f| f.id.as_str()).collect();
        let roots: Vec<&str> = self
            .folders
            .iter()
            .filter(|f| match f.parent_folder_id.as_deref() {
                None => true,
                Some(parent_id) => !ids.contains(parent_id),
            })
            .map(|f| f.id.as_str())
            .collect();

        let mut nodes = Vec::new();
        let mut visited = HashSet::new();
        for root in roots {
            self.push_subtree(root, 0, &mut nodes, &mut visited);
        }
        nodes
    }

    fn push_subtree<'a>(
        &'a self,
        id: &str,
        depth: usize,
        nodes: &mut Vec<FolderTreeNode<'a>>,
        visited: &mut HashSet<String>,
    ) {
        if !visited.insert(id.to_string()) {
            return;
        }
        let Some(folder) = self.folder(id) else {
            return;
        };
        nodes.push(FolderTreeNode { folder, depth });
        let children: Vec<&str> = self
            .folders
            .iter()
            .filter(|f| f.parent_folder_id.as_deref() == Some(id))
            .map(|f| f.id.as_str())
            .collect();
        for child in children {
            self.push_subtree(child, depth + 1, nodes, visited);
        }
    }
}
