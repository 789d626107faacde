//! Workspace and Thread domain types.
//!
//! A workspace is the top-level conversational container: it owns threads,
//! model/persona settings, and the knowledge linkage that feeds the context
//! assembler. Threads hold the append-only message log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::Message;
use crate::timestamp;

/// Per-workspace model and persona settings. All fields are optional;
/// unset fields fall back to configured defaults at send time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSettings {
    /// Model ID override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Sampling temperature override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Persona ID, resolved by the caller into a base system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,

    /// Full system-prompt override; when set, replaces the base prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// A top-level container owning threads, settings, and knowledge linkage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Unique workspace ID
    pub id: String,

    pub name: String,

    /// Conversation threads, in creation order
    #[serde(default)]
    pub threads: Vec<Thread>,

    /// Knowledge entity IDs (items or folders) attached to this workspace
    #[serde(default)]
    pub linked_knowledge: Vec<String>,

    /// Ordered subset of knowledge IDs selected for prompt injection.
    /// Not constrained to `linked_knowledge`.
    #[serde(default)]
    pub knowledge_in_context: Vec<String>,

    #[serde(default)]
    pub settings: WorkspaceSettings,

    #[serde(default = "chrono::Utc::now", with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "chrono::Utc::now", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Workspace {
    /// Create an empty workspace with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            threads: Vec::new(),
            linked_knowledge: Vec::new(),
            knowledge_in_context: Vec::new(),
            settings: WorkspaceSettings::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Find a thread by ID.
    pub fn thread(&self, thread_id: &str) -> Option<&Thread> {
        self.threads.iter().find(|t| t.id == thread_id)
    }
}

/// An append-only ordered message log within a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// Unique thread ID
    pub id: String,

    pub name: String,

    /// Ordered messages; append-only
    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(default = "chrono::Utc::now", with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "chrono::Utc::now", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Thread {
    /// Create an empty thread.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_workspace_is_empty() {
        let ws = Workspace::new("Project X");
        assert!(ws.threads.is_empty());
        assert!(ws.linked_knowledge.is_empty());
        assert!(ws.knowledge_in_context.is_empty());
        assert!(ws.settings.model.is_none());
    }

    #[test]
    fn workspace_roundtrip_keeps_nested_message_dates() {
        let mut ws = Workspace::new("Chat");
        let mut thread = Thread::new("General");
        thread.messages.push(Message::user("hi"));
        ws.threads.push(thread);

        let json = serde_json::to_string(&ws).unwrap();
        let back: Workspace = serde_json::from_str(&json).unwrap();
        assert_eq!(back.threads.len(), 1);
        assert_eq!(
            back.threads[0].messages[0].created_at,
            ws.threads[0].messages[0].created_at
        );
    }

    #[test]
    fn settings_omitted_when_unset() {
        let ws = Workspace::new("Minimal");
        let json = serde_json::to_string(&ws).unwrap();
        assert!(!json.contains("systemPrompt"));
        assert!(json.contains("linkedKnowledge"));
    }
}
