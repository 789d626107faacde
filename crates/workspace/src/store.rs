//! The workspace/thread store.
//!
//! Owns the workspace collection, the active workspace/thread selection,
//! and the per-workspace knowledge linkage. Every mutation write-through
//! persists the `workspaces` collection. Selection is session state and is
//! not persisted.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};

use tidepool_core::message::Message;
use tidepool_core::patch::WorkspacePatch;
use tidepool_core::workspace::{Thread, Workspace};
use tidepool_persistence::{StateStore, keys, load_collection, save_collection};

pub struct WorkspaceStore {
    workspaces: Vec<Workspace>,
    active_workspace: Option<String>,
    active_thread: Option<String>,
    state: Arc<dyn StateStore>,
}

impl WorkspaceStore {
    /// Load the workspace collection from the flat store. A missing or
    /// corrupt collection starts empty; nothing is selected.
    pub fn load(state: Arc<dyn StateStore>) -> Self {
        let workspaces: Vec<Workspace> = load_collection(state.as_ref(), keys::WORKSPACES);
        debug!(workspaces = workspaces.len(), "Workspace store loaded");
        Self {
            workspaces,
            active_workspace: None,
            active_thread: None,
            state,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn workspace(&self, id: &str) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.id == id)
    }

    pub fn active_workspace_id(&self) -> Option<&str> {
        self.active_workspace.as_deref()
    }

    pub fn active_thread_id(&self) -> Option<&str> {
        self.active_thread.as_deref()
    }

    // ── Workspace CRUD ────────────────────────────────────────────────────

    pub fn create_workspace(&mut self, name: impl Into<String>) -> Workspace {
        let workspace = Workspace::new(name);
        debug!(workspace_id = %workspace.id, "Created workspace");
        self.workspaces.push(workspace.clone());
        self.persist();
        workspace
    }

    /// Merge a patch into a workspace. Array fields, when present, fully
    /// replace the prior arrays. Always refreshes `updated_at`.
    pub fn update_workspace(&mut self, id: &str, patch: WorkspacePatch) -> Option<Workspace> {
        let workspace = self.workspaces.iter_mut().find(|w| w.id == id)?;
        if let Some(name) = patch.name {
            workspace.name = name;
        }
        if let Some(settings) = patch.settings {
            workspace.settings = settings;
        }
        if let Some(linked) = patch.linked_knowledge {
            workspace.linked_knowledge = linked;
        }
        if let Some(in_context) = patch.knowledge_in_context {
            workspace.knowledge_in_context = in_context;
        }
        workspace.updated_at = Utc::now();
        let updated = workspace.clone();
        self.persist();
        Some(updated)
    }

    /// Delete a workspace. Deleting the active one clears the selection.
    pub fn delete_workspace(&mut self, id: &str) -> bool {
        let before = self.workspaces.len();
        self.workspaces.retain(|w| w.id != id);
        let deleted = self.workspaces.len() < before;
        if deleted {
            if self.active_workspace.as_deref() == Some(id) {
                self.active_workspace = None;
                self.active_thread = None;
            }
            debug!(workspace_id = id, "Deleted workspace");
            self.persist();
        }
        deleted
    }

    /// Select a workspace, clearing any thread selection. An unknown ID
    /// logs and leaves the selection unchanged.
    pub fn select_workspace(&mut self, id: &str) {
        if self.workspace(id).is_none() {
            warn!(workspace_id = id, "Cannot select unknown workspace");
            return;
        }
        self.active_workspace = Some(id.to_string());
        self.active_thread = None;
    }

    // ── Threads ───────────────────────────────────────────────────────────

    /// Append an empty-message thread to a workspace.
    pub fn create_thread(&mut self, workspace_id: &str, name: impl Into<String>) -> Option<Thread> {
        let workspace = self.workspaces.iter_mut().find(|w| w.id == workspace_id)?;
        let thread = Thread::new(name);
        workspace.threads.push(thread.clone());
        workspace.updated_at = Utc::now();
        debug!(workspace_id, thread_id = %thread.id, "Created thread");
        self.persist();
        Some(thread)
    }

    /// Select a thread, validating both dimensions. On failure, logs and
    /// leaves the current selection unchanged — never errors.
    pub fn select_thread(&mut self, workspace_id: &str, thread_id: &str) {
        let Some(workspace) = self.workspace(workspace_id) else {
            warn!(workspace_id, "Cannot select thread in unknown workspace");
            return;
        };
        if workspace.thread(thread_id).is_none() {
            warn!(workspace_id, thread_id, "Cannot select unknown thread");
            return;
        }
        self.active_workspace = Some(workspace_id.to_string());
        self.active_thread = Some(thread_id.to_string());
    }

    pub fn rename_thread(
        &mut self,
        workspace_id: &str,
        thread_id: &str,
        name: impl Into<String>,
    ) -> Option<Thread> {
        let workspace = self.workspaces.iter_mut().find(|w| w.id == workspace_id)?;
        let thread = workspace.threads.iter_mut().find(|t| t.id == thread_id)?;
        thread.name = name.into();
        thread.updated_at = Utc::now();
        let renamed = thread.clone();
        workspace.updated_at = Utc::now();
        self.persist();
        Some(renamed)
    }

    /// Delete a thread. Deleting the selected thread clears the thread
    /// selection (the workspace selection stays).
    pub fn delete_thread(&mut self, workspace_id: &str, thread_id: &str) -> bool {
        let Some(workspace) = self.workspaces.iter_mut().find(|w| w.id == workspace_id) else {
            return false;
        };
        let before = workspace.threads.len();
        workspace.threads.retain(|t| t.id != thread_id);
        let deleted = workspace.threads.len() < before;
        if deleted {
            workspace.updated_at = Utc::now();
            if self.active_thread.as_deref() == Some(thread_id) {
                self.active_thread = None;
            }
            self.persist();
        }
        deleted
    }

    /// Append a message to a thread's log, refreshing both timestamps.
    pub fn append_message(
        &mut self,
        workspace_id: &str,
        thread_id: &str,
        message: Message,
    ) -> Option<Message> {
        let workspace = self.workspaces.iter_mut().find(|w| w.id == workspace_id)?;
        let thread = workspace.threads.iter_mut().find(|t| t.id == thread_id)?;
        thread.messages.push(message.clone());
        thread.updated_at = Utc::now();
        workspace.updated_at = Utc::now();
        self.persist();
        Some(message)
    }

    // ── Knowledge linkage ─────────────────────────────────────────────────

    /// Attach a knowledge entity ID to a workspace (duplicate-guarded).
    pub fn link_knowledge(&mut self, workspace_id: &str, entity_id: &str) {
        let Some(workspace) = self.workspaces.iter_mut().find(|w| w.id == workspace_id) else {
            return;
        };
        if !workspace.linked_knowledge.iter().any(|id| id == entity_id) {
            workspace.linked_knowledge.push(entity_id.to_string());
            workspace.updated_at = Utc::now();
            self.persist();
        }
    }

    /// Detach a knowledge entity from a workspace, pruning it from the
    /// in-context selection as well.
    pub fn unlink_knowledge(&mut self, workspace_id: &str, entity_id: &str) {
        let Some(workspace) = self.workspaces.iter_mut().find(|w| w.id == workspace_id) else {
            return;
        };
        let before = workspace.linked_knowledge.len() + workspace.knowledge_in_context.len();
        workspace.linked_knowledge.retain(|id| id != entity_id);
        workspace.knowledge_in_context.retain(|id| id != entity_id);
        if workspace.linked_knowledge.len() + workspace.knowledge_in_context.len() < before {
            workspace.updated_at = Utc::now();
            self.persist();
        }
    }

    /// Flip an entity's membership in the prompt-injection selection.
    /// Independent of `linked_knowledge` by design of the original system.
    pub fn toggle_knowledge_in_context(&mut self, workspace_id: &str, entity_id: &str) {
        let Some(workspace) = self.workspaces.iter_mut().find(|w| w.id == workspace_id) else {
            return;
        };
        let before = workspace.knowledge_in_context.len();
        workspace.knowledge_in_context.retain(|id| id != entity_id);
        if workspace.knowledge_in_context.len() == before {
            workspace.knowledge_in_context.push(entity_id.to_string());
        }
        workspace.updated_at = Utc::now();
        self.persist();
    }

    // ── Persistence ───────────────────────────────────────────────────────

    fn persist(&self) {
        if let Err(e) = save_collection(self.state.as_ref(), keys::WORKSPACES, &self.workspaces) {
            error!(error = %e, "Failed to persist workspaces");
        }
    }
}
