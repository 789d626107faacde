//! The chat pipeline: resolve preconditions, assemble context, delegate to
//! the completion collaborator, record the exchange.

use std::sync::Arc;

use tracing::debug;

use tidepool_config::AppConfig;
use tidepool_context::{AssemblyInput, ContextAssembler};
use tidepool_core::collaborator::{CompletionProvider, CompletionRequest, PromptTurn};
use tidepool_core::error::{Error, ExternalServiceError, ReferenceError, Result};
use tidepool_core::message::Message;
use tidepool_store::KnowledgeStore;

use crate::store::WorkspaceStore;

/// Drives a single conversational turn. Holds the injected completion
/// collaborator and the configured defaults; the stores are passed in by
/// reference per call.
pub struct ChatService {
    provider: Arc<dyn CompletionProvider>,
    config: AppConfig,
}

impl ChatService {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: AppConfig) -> Self {
        Self { provider, config }
    }

    /// Send a user message on the active thread.
    ///
    /// Preconditions resolve fail-closed, each with its own error variant:
    /// active workspace, active thread, API key, then model and temperature
    /// (workspace settings falling back to configured defaults). On
    /// success: the user message is appended, the knowledge context is
    /// assembled over `knowledge_in_context` and concatenated onto the
    /// effective system prompt, the collaborator is called once with the
    /// full history, and the assistant reply is appended and returned.
    ///
    /// No retry and no cancellation — a superseded call still completes and
    /// writes its result into the thread.
    pub async fn send_message(
        &self,
        workspaces: &mut WorkspaceStore,
        knowledge: &KnowledgeStore,
        user_text: &str,
        base_system_prompt: &str,
    ) -> Result<Message> {
        // (a) resolve preconditions, fail-closed
        let workspace_id = workspaces
            .active_workspace_id()
            .map(str::to_string)
            .ok_or(ReferenceError::NoActiveWorkspace)?;
        let thread_id = workspaces
            .active_thread_id()
            .map(str::to_string)
            .ok_or_else(|| ReferenceError::NoActiveThread(workspace_id.clone()))?;
        if self.config.api_key.is_none() {
            return Err(ExternalServiceError::MissingApiKey.into());
        }
        let workspace = workspaces
            .workspace(&workspace_id)
            .ok_or_else(|| ReferenceError::WorkspaceNotFound(workspace_id.clone()))?;
        if workspace.thread(&thread_id).is_none() {
            return Err(Error::Reference(ReferenceError::ThreadNotFound {
                workspace_id: workspace_id.clone(),
                thread_id: thread_id.clone(),
            }));
        }

        let model = workspace
            .settings
            .model
            .clone()
            .unwrap_or_else(|| self.config.default_model.clone());
        let temperature = workspace
            .settings
            .temperature
            .unwrap_or(self.config.default_temperature);
        let system_base = workspace
            .settings
            .system_prompt
            .clone()
            .unwrap_or_else(|| base_system_prompt.to_string());
        let selection = workspace.knowledge_in_context.clone();

        // (b) append the user message
        workspaces.append_message(&workspace_id, &thread_id, Message::user(user_text));

        // (c) assemble the knowledge context — recomputed on every send
        let assembled = ContextAssembler::new().assemble(&AssemblyInput {
            selection: &selection,
            folders: knowledge.folders(),
            items: knowledge.items(),
        });

        // (d) concatenate onto the system prompt
        let system_prompt = if assembled.text.is_empty() {
            system_base
        } else {
            format!("{system_base}\n\n{}", assembled.text)
        };

        // (e) delegate with the full message history
        let workspace = workspaces
            .workspace(&workspace_id)
            .ok_or_else(|| ReferenceError::WorkspaceNotFound(workspace_id.clone()))?;
        let thread = workspace
            .thread(&thread_id)
            .ok_or_else(|| ReferenceError::ThreadNotFound {
                workspace_id: workspace_id.clone(),
                thread_id: thread_id.clone(),
            })?;
        let mut turns = vec![PromptTurn::system(system_prompt)];
        turns.extend(thread.messages.iter().map(PromptTurn::from));

        debug!(
            model = %model,
            turns = turns.len(),
            resolved = assembled.resolved.len(),
            unresolved = assembled.unresolved.len(),
            "Dispatching completion request"
        );
        let reply = self
            .provider
            .complete(CompletionRequest {
                model,
                messages: turns,
                temperature,
            })
            .await?;

        // (f) append and return the assistant message
        let message = Message::assistant(reply);
        workspaces.append_message(&workspace_id, &thread_id, message.clone());
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tidepool_persistence::InMemoryStore;

    /// Returns a scripted reply and records every request it receives.
    struct RecordingProvider {
        reply: String,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl RecordingProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.into(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn last_request(&self) -> CompletionRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl CompletionProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording_mock"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> std::result::Result<String, ExternalServiceError> {
            self.requests.lock().unwrap().push(request);
            Ok(self.reply.clone())
        }
    }

    struct FailingProvider;

    #[async_trait::async_trait]
    impl CompletionProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing_mock"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> std::result::Result<String, ExternalServiceError> {
            Err(ExternalServiceError::Completion("upstream 500".into()))
        }
    }

    fn config_with_key() -> AppConfig {
        AppConfig {
            api_key: Some("sk-test".into()),
            ..Default::default()
        }
    }

    fn selected_stores() -> (WorkspaceStore, KnowledgeStore, String, String) {
        let mut workspaces = WorkspaceStore::load(Arc::new(InMemoryStore::new()));
        let knowledge = KnowledgeStore::load(Arc::new(InMemoryStore::new()));
        let workspace = workspaces.create_workspace("Main");
        let thread = workspaces.create_thread(&workspace.id, "General").unwrap();
        workspaces.select_thread(&workspace.id, &thread.id);
        (workspaces, knowledge, workspace.id, thread.id)
    }

    #[tokio::test]
    async fn happy_path_appends_both_messages() {
        let (mut workspaces, knowledge, workspace_id, thread_id) = selected_stores();
        let provider = Arc::new(RecordingProvider::new("Hello back"));
        let chat = ChatService::new(provider.clone(), config_with_key());

        let reply = chat
            .send_message(&mut workspaces, &knowledge, "Hello", "You are helpful.")
            .await
            .unwrap();
        assert_eq!(reply.content, "Hello back");

        let thread = workspaces
            .workspace(&workspace_id)
            .unwrap()
            .thread(&thread_id)
            .unwrap();
        assert_eq!(thread.messages.len(), 2);
        assert_eq!(thread.messages[0].content, "Hello");
        assert_eq!(thread.messages[1].content, "Hello back");
    }

    #[tokio::test]
    async fn no_active_workspace_fails_closed() {
        let mut workspaces = WorkspaceStore::load(Arc::new(InMemoryStore::new()));
        let knowledge = KnowledgeStore::load(Arc::new(InMemoryStore::new()));
        let chat = ChatService::new(Arc::new(RecordingProvider::new("x")), config_with_key());

        let err = chat
            .send_message(&mut workspaces, &knowledge, "Hi", "base")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Reference(ReferenceError::NoActiveWorkspace)
        ));
    }

    #[tokio::test]
    async fn no_active_thread_fails_closed() {
        let mut workspaces = WorkspaceStore::load(Arc::new(InMemoryStore::new()));
        let knowledge = KnowledgeStore::load(Arc::new(InMemoryStore::new()));
        let workspace = workspaces.create_workspace("Main");
        workspaces.select_workspace(&workspace.id);
        let chat = ChatService::new(Arc::new(RecordingProvider::new("x")), config_with_key());

        let err = chat
            .send_message(&mut workspaces, &knowledge, "Hi", "base")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Reference(ReferenceError::NoActiveThread(_))
        ));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_appending() {
        let (mut workspaces, knowledge, workspace_id, thread_id) = selected_stores();
        let chat = ChatService::new(
            Arc::new(RecordingProvider::new("x")),
            AppConfig::default(), // no key
        );

        let err = chat
            .send_message(&mut workspaces, &knowledge, "Hi", "base")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::External(ExternalServiceError::MissingApiKey)
        ));

        let thread = workspaces
            .workspace(&workspace_id)
            .unwrap()
            .thread(&thread_id)
            .unwrap();
        assert!(thread.messages.is_empty());
    }

    #[tokio::test]
    async fn provider_failure_keeps_user_message_only() {
        let (mut workspaces, knowledge, workspace_id, thread_id) = selected_stores();
        let chat = ChatService::new(Arc::new(FailingProvider), config_with_key());

        let err = chat
            .send_message(&mut workspaces, &knowledge, "Hi", "base")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::External(_)));

        // the user turn was recorded; no assistant turn was
        let thread = workspaces
            .workspace(&workspace_id)
            .unwrap()
            .thread(&thread_id)
            .unwrap();
        assert_eq!(thread.messages.len(), 1);
    }

    #[tokio::test]
    async fn assembled_context_lands_in_system_prompt() {
        let (mut workspaces, _, workspace_id, _thread_id) = selected_stores();
        let mut knowledge = KnowledgeStore::load(Arc::new(InMemoryStore::new()));
        let item = knowledge.create_item("Fact", "Water is wet.", None, vec![], vec![]);
        workspaces.link_knowledge(&workspace_id, &item.id);
        workspaces.toggle_knowledge_in_context(&workspace_id, &item.id);

        let provider = Arc::new(RecordingProvider::new("Noted"));
        let chat = ChatService::new(provider.clone(), config_with_key());
        chat.send_message(&mut workspaces, &knowledge, "What is wet?", "You are helpful.")
            .await
            .unwrap();

        let request = provider.last_request();
        let system = &request.messages[0];
        assert!(system.content.starts_with("You are helpful."));
        assert!(system.content.contains("## Fact ##"));
        assert!(system.content.contains("Water is wet."));
    }

    #[tokio::test]
    async fn workspace_settings_override_defaults() {
        let (mut workspaces, knowledge, workspace_id, _) = selected_stores();
        workspaces.update_workspace(
            &workspace_id,
            tidepool_core::patch::WorkspacePatch {
                settings: Some(tidepool_core::workspace::WorkspaceSettings {
                    model: Some("custom-model".into()),
                    temperature: Some(0.2),
                    persona_id: None,
                    system_prompt: Some("Override prompt.".into()),
                }),
                ..Default::default()
            },
        );

        let provider = Arc::new(RecordingProvider::new("ok"));
        let chat = ChatService::new(provider.clone(), config_with_key());
        chat.send_message(&mut workspaces, &knowledge, "Hi", "ignored base")
            .await
            .unwrap();

        let request = provider.last_request();
        assert_eq!(request.model, "custom-model");
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
        assert!(request.messages[0].content.starts_with("Override prompt."));
        assert!(!request.messages[0].content.contains("ignored base"));
    }
}
