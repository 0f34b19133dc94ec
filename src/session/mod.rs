// src/session/mod.rs

//! Conversation session controller.
//!
//! Owns the per-turn lifecycle: assemble context from the memory tiers, run
//! the prompt engine, suspend on the completion collaborator with a timeout
//! and a cancellation token, then fold the outcome back into memory. Only a
//! successful turn mutates the medium and long tiers; a failed turn leaves a
//! short-term marker and a cancelled turn leaves nothing at all.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::context::{ConversationContext, EnvironmentProvider};
use crate::error::OrionError;
use crate::llm::{ChatMessage, CompletionClient, CompletionRequest};
use crate::memory::{MemoryManager, TierClear};
use crate::persona::{Mode, Personality};
use crate::prompt::{self, ActionSuggestion, IntentTag};

/// Where the controller is in the turn lifecycle. `Completed` and `Failed`
/// persist until the next turn begins, so callers can inspect the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    ContextAssembled,
    AwaitingModelResponse,
    Completed,
    Failed,
}

/// Per-session knobs. Defaults match the process config defaults so tests
/// can build a controller without touching the environment.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub turn_timeout: Duration,
    pub medium_limit: usize,
    pub long_limit: usize,
    pub fact_delta: f32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            turn_timeout: Duration::from_secs(60),
            medium_limit: 3,
            long_limit: 5,
            fact_delta: 0.4,
        }
    }
}

/// What one completed turn produced.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub turn: u64,
    pub reply: String,
    pub intent: IntentTag,
    pub suggested_actions: Vec<ActionSuggestion>,
}

pub struct SessionController {
    manager: MemoryManager,
    client: Arc<dyn CompletionClient>,
    environment: Box<dyn EnvironmentProvider>,
    options: SessionOptions,
    cancel: CancellationToken,
    turn_seq: u64,
    state: TurnState,
}

impl SessionController {
    pub fn new(
        manager: MemoryManager,
        client: Arc<dyn CompletionClient>,
        environment: Box<dyn EnvironmentProvider>,
        options: SessionOptions,
    ) -> Self {
        Self {
            manager,
            client,
            environment,
            options,
            cancel: CancellationToken::new(),
            turn_seq: 0,
            state: TurnState::Idle,
        }
    }

    /// Token for the turn about to run (or currently running). Cancelling it
    /// aborts the in-flight completion without mutating any memory tier. The
    /// token is replaced once the turn settles, so a stale cancel cannot
    /// touch a later turn.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run one full turn for `user_message`.
    pub async fn run_turn(&mut self, user_message: &str) -> Result<TurnReport, OrionError> {
        self.state = TurnState::Idle;
        self.turn_seq += 1;
        let seq = self.turn_seq;
        let cancel = self.cancel.clone();

        let context = self.assemble_context();
        let output = prompt::evaluate_turn(&context, user_message);
        self.state = TurnState::ContextAssembled;
        debug!(turn = seq, intent = ?output.intent, "context assembled");

        let request = CompletionRequest {
            system_prompt: output.system_prompt,
            history: history_messages(&context),
            user_message: user_message.to_string(),
            temperature: context.mode.config().temperature,
        };

        self.state = TurnState::AwaitingModelResponse;
        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(OrionError::Cancelled),
            result = tokio::time::timeout(self.options.turn_timeout, self.client.complete(request)) => {
                match result {
                    Ok(inner) => inner,
                    Err(_) => Err(OrionError::Timeout(self.options.turn_timeout)),
                }
            }
        };

        // Fresh token per turn; a cancel raised for this turn must not
        // outlive it.
        self.cancel = CancellationToken::new();

        match outcome {
            Ok(reply) => {
                self.fold_turn(user_message, &reply, &output.project_signal, &output.fact_signal);
                self.state = TurnState::Completed;
                info!(turn = seq, intent = ?output.intent, "turn completed");
                Ok(TurnReport {
                    turn: seq,
                    reply,
                    intent: output.intent,
                    suggested_actions: output.suggested_actions,
                })
            }
            Err(OrionError::Cancelled) => {
                info!(turn = seq, "turn cancelled");
                self.state = TurnState::Idle;
                Err(OrionError::Cancelled)
            }
            Err(err) => {
                warn!(turn = seq, error = %err, "turn failed");
                self.manager.record_failed_turn(user_message);
                self.state = TurnState::Failed;
                Err(err)
            }
        }
    }

    fn assemble_context(&self) -> ConversationContext {
        let hint = self
            .manager
            .short_term()
            .last()
            .map(|t| t.user.clone())
            .unwrap_or_default();
        ConversationContext {
            mode: self.manager.mode(),
            personality: self.manager.personality().clone(),
            short_term: self.manager.short_term(),
            relevant_medium: self
                .manager
                .select_relevant_medium(&hint, self.options.medium_limit),
            relevant_long: self
                .manager
                .select_relevant_long(&hint, self.options.long_limit),
            environment: self.environment.current(),
        }
    }

    /// Successful-turn bookkeeping: window append, then autonomous folding
    /// into the medium and long tiers from the extracted signals.
    fn fold_turn(
        &mut self,
        user_message: &str,
        reply: &str,
        project: &Option<prompt::ProjectSignal>,
        fact: &Option<prompt::FactSignal>,
    ) {
        self.manager.record_turn(user_message, reply);
        if let Some(signal) = project {
            self.manager
                .upsert_project_context(&signal.key, &signal.summary);
        }
        if let Some(signal) = fact {
            self.manager
                .reinforce_fact(&signal.key, &signal.value, self.options.fact_delta);
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.manager.mode()
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.manager.set_mode(mode);
    }

    pub fn personality(&self) -> &Personality {
        self.manager.personality()
    }

    pub fn set_personality(&mut self, personality: Personality) {
        self.manager.set_personality(personality);
    }

    /// Drop the short-term window; durable tiers are untouched.
    pub fn reset_conversation(&mut self) {
        self.manager.clear(TierClear::Short);
    }

    pub fn clear_memory(&mut self, tier: TierClear) {
        self.manager.clear(tier);
    }

    pub fn manager(&self) -> &MemoryManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut MemoryManager {
        &mut self.manager
    }

    /// Teardown: persist anything still dirty.
    pub fn shutdown(&mut self) {
        self.manager.flush();
    }
}

/// Serialize the short-term window for the completion API. Failure markers
/// carry no reply and are excluded.
fn history_messages(context: &ConversationContext) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(context.short_term.len() * 2);
    for turn in &context.short_term {
        let Some(assistant) = &turn.assistant else {
            continue;
        };
        messages.push(ChatMessage::new("user", &turn.user));
        messages.push(ChatMessage::new("assistant", assistant));
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Connectivity, EnvironmentContext, TimeOfDay};
    use crate::identity::DeviceKind;
    use crate::memory::MemoryPolicy;
    use crate::storage::{KeyValueStore, MemoryStore};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapKv(Mutex<HashMap<String, String>>);

    impl KeyValueStore for MapKv {
        fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }
        fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            self.0.lock().unwrap().insert(key.into(), value.into());
            Ok(())
        }
        fn delete(&self, key: &str) -> anyhow::Result<()> {
            self.0.lock().unwrap().remove(key);
            Ok(())
        }
    }

    struct FixedReply(&'static str);

    #[async_trait]
    impl CompletionClient for FixedReply {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, OrionError> {
            Ok(self.0.to_string())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl CompletionClient for AlwaysFails {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, OrionError> {
            Err(OrionError::Collaborator("rate limited".into()))
        }
    }

    struct NeverReplies;

    #[async_trait]
    impl CompletionClient for NeverReplies {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, OrionError> {
            std::future::pending().await
        }
    }

    struct StaticEnv;

    impl EnvironmentProvider for StaticEnv {
        fn current(&self) -> EnvironmentContext {
            EnvironmentContext {
                time_of_day: TimeOfDay::Morning,
                device: DeviceKind::Desktop,
                connectivity: Connectivity::Online,
            }
        }
    }

    fn controller(client: Arc<dyn CompletionClient>, options: SessionOptions) -> SessionController {
        let store = MemoryStore::new(Box::new(MapKv(Mutex::new(HashMap::new()))), "dev_test");
        let manager = MemoryManager::new(store, MemoryPolicy::default());
        SessionController::new(manager, client, Box::new(StaticEnv), options)
    }

    #[tokio::test]
    async fn successful_turn_records_and_folds_memory() {
        let mut session = controller(Arc::new(FixedReply("noted")), SessionOptions::default());
        let report = session
            .run_turn("Remember that my editor is helix")
            .await
            .unwrap();
        assert_eq!(report.reply, "noted");
        assert_eq!(session.state(), TurnState::Completed);
        assert_eq!(session.manager().short_term().len(), 1);
        let facts = session.manager().select_relevant_long("editor", 1);
        assert_eq!(facts[0].0, "editor");
        assert!((facts[0].1.confidence - 0.4).abs() < 1e-6);
    }

    #[tokio::test]
    async fn collaborator_failure_leaves_only_a_marker() {
        let mut session = controller(Arc::new(AlwaysFails), SessionOptions::default());
        let err = session.run_turn("what's the weather?").await.unwrap_err();
        assert!(matches!(err, OrionError::Collaborator(_)));
        assert_eq!(session.state(), TurnState::Failed);
        let turns = session.manager().short_term();
        assert_eq!(turns.len(), 1);
        assert!(turns[0].failed);
        assert!(turns[0].assistant.is_none());
    }

    #[tokio::test]
    async fn timeout_maps_to_the_timeout_error() {
        let options = SessionOptions {
            turn_timeout: Duration::from_millis(10),
            ..SessionOptions::default()
        };
        let mut session = controller(Arc::new(NeverReplies), options);
        let err = session.run_turn("anything").await.unwrap_err();
        assert!(matches!(err, OrionError::Timeout(_)));
        assert!(session.manager().short_term()[0].failed);
    }

    #[tokio::test]
    async fn cancellation_mutates_nothing() {
        let mut session = controller(Arc::new(NeverReplies), SessionOptions::default());
        let token = session.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });
        let err = session.run_turn("cancel me").await.unwrap_err();
        assert!(matches!(err, OrionError::Cancelled));
        assert!(session.manager().short_term().is_empty());
        // The replacement token is untouched; the next turn runs normally.
        assert!(!session.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn reset_conversation_keeps_durable_tiers() {
        let mut session = controller(Arc::new(FixedReply("ok")), SessionOptions::default());
        session.run_turn("my favorite color is blue").await.unwrap();
        session.reset_conversation();
        assert!(session.manager().short_term().is_empty());
        assert_eq!(
            session.manager().select_relevant_long("color", 1)[0].0,
            "favorite_color"
        );
    }
}
