//! Mock implementations for testing
//!
//! These mocks enable session tests without a live model or tools.

use super::traits::ToolHandler;
use crate::llm::{ChatClient, ChatRequest, Generation, LlmError};
use crate::tools::{ToolArgs, ToolError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

// ============================================================================
// Mock Chat Client
// ============================================================================

/// Mock chat client that returns queued generations
pub struct MockChatClient {
    responses: Mutex<VecDeque<Result<Generation, LlmError>>>,
    model_id: String,
    /// Record of all requests made
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful generation
    pub fn queue_response(&self, generation: Generation) {
        self.responses.lock().unwrap().push_back(Ok(generation));
    }

    pub fn queue_text(&self, text: &str) {
        self.queue_response(Generation::text(text));
    }

    /// Queue a generation that only requests a hand-off
    pub fn queue_handoff(&self, target: &str) {
        self.queue_response(
            Generation::text("")
                .with_call(format!("handoff_to_{target}"), serde_json::json!({})),
        );
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn generate(&self, request: &ChatRequest) -> Result<Generation, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Mock Tool Handler
// ============================================================================

/// Mock tool handler with predefined outputs
#[derive(Default)]
pub struct MockToolHandler {
    outputs: HashMap<String, Result<Value, ToolError>>,
    /// Record of tool executions
    pub executions: Mutex<Vec<(String, ToolArgs)>>,
}

impl MockToolHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool with a predefined output
    #[must_use]
    pub fn with_tool(mut self, name: impl Into<String>, output: Result<Value, ToolError>) -> Self {
        self.outputs.insert(name.into(), output);
        self
    }

    /// Get recorded executions
    pub fn recorded_executions(&self) -> Vec<(String, ToolArgs)> {
        self.executions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolHandler for MockToolHandler {
    async fn invoke(&self, name: &str, args: &ToolArgs) -> Result<Value, ToolError> {
        self.executions
            .lock()
            .unwrap()
            .push((name.to_string(), args.clone()));
        self.outputs
            .get(name)
            .cloned()
            .unwrap_or_else(|| Err(ToolError::UnknownTool(name.to_string())))
    }
}

// ============================================================================
// Session Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Handoff, RequestId, Role};
    use crate::llm::{LlmErrorKind, ToolDefinition};
    use crate::registry::{ParticipantSpec, Registry};
    use crate::runtime::{Session, SessionConfig, SessionError};
    use crate::state_machine::{RouterState, RunFailure, UserResponse};
    use crate::termination::TerminationEvaluator;
    use serde_json::json;
    use std::sync::Arc;

    type TestSession = Session<Arc<MockChatClient>, Arc<MockToolHandler>>;

    fn refund_tool() -> ToolDefinition {
        ToolDefinition {
            name: "lookup_invoice".into(),
            description: "Find an invoice".into(),
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }

    /// Coordinator -> {Billing, Support}; Billing is tool-using and may only go back
    fn support_desk() -> Arc<Registry> {
        let mut builder = Registry::builder();
        builder
            .register(
                ParticipantSpec::plain("Coordinator", "Route the customer"),
                ["Billing", "Support"],
            )
            .unwrap()
            .register(
                ParticipantSpec::tool_using("Billing", "Handle billing", vec![refund_tool()]),
                ["Coordinator"],
            )
            .unwrap()
            .register(ParticipantSpec::plain("Support", "Handle support"), ["Coordinator"])
            .unwrap()
            .with_start("Coordinator");
        Arc::new(builder.finalize().unwrap())
    }

    struct Harness {
        session: TestSession,
        llm: Arc<MockChatClient>,
        tools: Arc<MockToolHandler>,
    }

    fn harness(max_steps: usize) -> Harness {
        harness_with(
            max_steps,
            MockToolHandler::new().with_tool("lookup_invoice", Ok(json!({"invoice": "INV-7"}))),
        )
    }

    fn harness_with(max_steps: usize, tools: MockToolHandler) -> Harness {
        let llm = Arc::new(MockChatClient::new("test-model"));
        let tools = Arc::new(tools);
        let config = SessionConfig {
            max_steps,
            termination: TerminationEvaluator::new(["that's it", "goodbye"]),
        };
        let session = Session::new(support_desk(), llm.clone(), tools.clone(), config);
        Harness { session, llm, tools }
    }

    fn only_pending(state: &RouterState) -> RequestId {
        assert_eq!(state.pending().len(), 1, "expected one pending request");
        state.pending()[0].id.clone()
    }

    #[tokio::test]
    async fn test_handoff_to_billing_then_suspend() {
        let mut h = harness(16);
        h.llm.queue_handoff("Billing");
        h.llm.queue_text("I can help with cancelling. What is your account email?");

        let state = h
            .session
            .start("I want to cancel my subscription")
            .await
            .unwrap();

        let registry = h.session.registry();
        let coordinator = registry.lookup("Coordinator").unwrap();
        let billing = registry.lookup("Billing").unwrap();
        assert!(state.is_suspended());
        assert_eq!(state.pending()[0].participant, billing);

        let log = h.session.current_log();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].role, Role::User);
        assert_eq!(
            log[1].handoff,
            Some(Handoff {
                source: coordinator,
                target: billing
            })
        );
        assert_eq!(log[2].author, Some(billing));

        let requests = h.llm.recorded_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].system_prompt, "Handle billing");
    }

    #[tokio::test]
    async fn test_resume_appends_reply_then_requester_runs() {
        let mut h = harness(16);
        h.llm.queue_text("Which account?");
        let state = h.session.start("Hello").await.unwrap();
        let id = only_pending(&state);

        h.llm.queue_text("Found it.");
        let state = h
            .session
            .resume(HashMap::from([(id.clone(), UserResponse::reply("acct-42"))]))
            .await
            .unwrap();
        assert!(state.is_suspended());

        let log = h.session.current_log();
        assert_eq!(log.len(), 4);
        assert_eq!(log[2].role, Role::User);
        assert_eq!(log[2].text, "acct-42");
        assert_eq!(log[2].in_reply_to, Some(id));
        assert_eq!(log[3].text, "Found it.");
        assert_eq!(log[3].author, h.session.registry().lookup("Coordinator"));
    }

    #[tokio::test]
    async fn test_farewell_reply_terminates_and_closes() {
        let mut h = harness(16);
        h.llm.queue_text("Anything else?");
        let state = h.session.start("Hi").await.unwrap();
        let id = only_pending(&state);

        let state = h
            .session
            .resume(HashMap::from([(
                id,
                UserResponse::reply("Thanks, that's it for now"),
            )]))
            .await
            .unwrap();
        assert_eq!(state, RouterState::Terminated { failure: None });
        assert_eq!(h.llm.recorded_requests().len(), 1);

        let closed_len = h.session.current_log().len();
        let err = h.session.resume(HashMap::new()).await.unwrap_err();
        assert_eq!(err, SessionError::SessionClosed);
        let err = h.session.start("again").await.unwrap_err();
        assert_eq!(err, SessionError::SessionClosed);
        assert_eq!(h.session.current_log().len(), closed_len);
    }

    #[tokio::test]
    async fn test_unknown_and_missing_responses_leave_state_unchanged() {
        let mut h = harness(16);
        h.llm.queue_text("Which account?");
        let state = h.session.start("Hello").await.unwrap();
        let log_before = h.session.current_log().to_vec();

        let err = h
            .session
            .resume(HashMap::from([(
                RequestId::from("not-a-request"),
                UserResponse::reply("x"),
            )]))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::UnknownRequest(RequestId::from("not-a-request")));
        assert_eq!(h.session.state(), &state);

        let err = h.session.resume(HashMap::new()).await.unwrap_err();
        assert!(matches!(err, SessionError::IncompleteResponse { ref missing } if missing.len() == 1));
        assert_eq!(h.session.state(), &state);
        assert_eq!(h.session.current_log(), log_before.as_slice());
    }

    #[tokio::test]
    async fn test_disallowed_handoff_terminates_with_failure() {
        let mut h = harness(16);
        h.llm.queue_handoff("Billing");
        h.llm.queue_handoff("Support");

        let err = h.session.start("Refund please").await.unwrap_err();
        assert_eq!(
            err,
            SessionError::Run(RunFailure::InvalidHandoff {
                participant: "Billing".into(),
                target: "Support".into(),
                allowed: vec!["Coordinator".into()],
            })
        );
        assert!(h.session.state().is_terminated());
        assert!(h.session.state().failure().is_some());

        // The offending turn is kept
        let log = h.session.current_log();
        assert_eq!(log.len(), 3);
        let support = h.session.registry().lookup("Support").unwrap();
        assert_eq!(log[2].handoff.map(|hf| hf.target), Some(support));
    }

    #[tokio::test]
    async fn test_failed_tool_keeps_preceding_reply() {
        let mut h = harness_with(
            16,
            MockToolHandler::new().with_tool(
                "lookup_invoice",
                Err(ToolError::Failed {
                    tool: "lookup_invoice".into(),
                    message: "billing backend unavailable".into(),
                }),
            ),
        );
        h.llm.queue_handoff("Billing");
        h.llm.queue_response(
            Generation::text("Let me look up your invoice.").with_call("lookup_invoice", json!({})),
        );

        let err = h.session.start("refund please").await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Run(RunFailure::Tool { ref tool, .. }) if tool == "lookup_invoice"
        ));
        assert!(h.session.state().is_terminated());

        let texts: Vec<&str> = h
            .session
            .current_log()
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, ["refund please", "", "Let me look up your invoice."]);
    }

    #[tokio::test]
    async fn test_handoff_to_unregistered_name_keeps_reply() {
        let mut h = harness(16);
        h.llm.queue_response(
            Generation::text("Routing you to refunds.").with_call("handoff_to_Refunds", json!({})),
        );

        let err = h.session.start("refund please").await.unwrap_err();
        assert_eq!(
            err,
            SessionError::Run(RunFailure::InvalidHandoff {
                participant: "Coordinator".into(),
                target: "Refunds".into(),
                allowed: vec!["Billing".into(), "Support".into()],
            })
        );
        assert!(h.session.state().is_terminated());

        let log = h.session.current_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].text, "Routing you to refunds.");
        assert_eq!(log[1].handoff, None);
        assert_eq!(log[1].author, Some(h.session.registry().lookup("Coordinator").unwrap()));
    }

    #[tokio::test]
    async fn test_tool_results_then_answer() {
        let mut h = harness(16);
        h.llm.queue_handoff("Billing");
        h.llm.queue_response(
            Generation::text("Let me check.").with_call("lookup_invoice", json!({"id": "7"})),
        );
        h.llm.queue_text("Your invoice is INV-7.");

        let state = h.session.start("Where is my invoice?").await.unwrap();
        assert!(state.is_suspended());

        let texts: Vec<&str> = h
            .session
            .current_log()
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts[2], "Let me check.");
        assert!(texts[3].starts_with("Tool result (lookup_invoice):"));
        assert_eq!(texts[4], "Your invoice is INV-7.");

        let executions = h.tools.recorded_executions();
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].1.get("id").map(String::as_str), Some("7"));
    }

    #[tokio::test]
    async fn test_ping_pong_hits_step_limit() {
        let mut h = harness(3);
        for _ in 0..4 {
            h.llm.queue_handoff("Billing");
            h.llm.queue_handoff("Coordinator");
        }

        let err = h.session.start("loop").await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Run(RunFailure::StepLimitExceeded { limit: 3, .. })
        ));
        assert_eq!(h.llm.recorded_requests().len(), 3);
    }

    #[tokio::test]
    async fn test_upstream_error_keeps_partial_log() {
        let mut h = harness(16);
        h.llm.queue_error(LlmError::auth("bad key"));

        let err = h.session.start("Hi").await.unwrap_err();
        assert_eq!(err.kind(), "Upstream");
        assert!(matches!(
            h.session.state().failure(),
            Some(RunFailure::Upstream {
                error_kind: LlmErrorKind::Auth,
                ..
            })
        ));
        assert_eq!(h.session.current_log().len(), 1);
    }

    #[tokio::test]
    async fn test_terminate_response_and_farewell_opening() {
        let mut h = harness(16);
        h.llm.queue_text("Yes?");
        let state = h.session.start("Hi").await.unwrap();
        let id = only_pending(&state);
        let state = h
            .session
            .resume(HashMap::from([(id, UserResponse::Terminate)]))
            .await
            .unwrap();
        assert!(state.is_terminated());
        assert_eq!(h.session.current_log().len(), 2);

        let mut h = harness(16);
        let state = h.session.start("goodbye").await.unwrap();
        assert!(state.is_terminated());
        assert!(h.llm.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_current_log_is_stable_between_calls() {
        let mut h = harness(16);
        h.llm.queue_text("Hello!");
        h.session.start("Hi").await.unwrap();
        let first = h.session.current_log().to_vec();
        assert_eq!(h.session.current_log(), first.as_slice());
        assert!(!h.session.id().is_empty());
    }
}
