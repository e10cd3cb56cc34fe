//! Tool-calling assistant loop.
//!
//! One request runs at most [`MAX_TURNS`] model turns. Each turn either answers in text,
//! which ends the loop, or requests tool calls; every call runs against the request's
//! [`Workspace`] and its result goes back to the model as a tool message. Tool failures
//! are reported to the model and appended to the final explanation.

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::assistant::memory::ConversationStore;
use crate::assistant::prompts::{
    ASSISTANT_SYSTEM, ASSISTANT_USER, DOCUMENTS_CONTEXT, RAG_CONTEXT, SKILLS_CONTEXT,
};
use crate::assistant::tools::{execute, tool_specs, ToolContext, UpdatedSkills, Workspace};
use crate::llm_client::prompts::{fill_template, Language};
use crate::llm_client::{ChatMessage, LlmClient, LlmError, LlmParams};
use crate::rag::{Embedder, RagStore, RetrievedContext};

pub const MAX_TURNS: usize = 5;
const RETRIEVE_K_CV: usize = 3;
const RETRIEVE_K_JD: usize = 2;
const PROMPT_SKILLS: usize = 20;
/// Characters of the original CV and job description quoted in the user turn.
const DOCUMENT_EXCERPT_CHARS: usize = 500;
const STEP_LIMIT_MESSAGE: &str = "Stopped before finishing: too many tool steps were needed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistantAction {
    UpdateCv,
    UpdateSkills,
    UpdateBoth,
    NoChange,
}

impl AssistantAction {
    fn from_flags(cv_changed: bool, skills_changed: bool) -> Self {
        match (cv_changed, skills_changed) {
            (true, true) => AssistantAction::UpdateBoth,
            (true, false) => AssistantAction::UpdateCv,
            (false, true) => AssistantAction::UpdateSkills,
            (false, false) => AssistantAction::NoChange,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssistantInput {
    pub request: String,
    pub original_cv: String,
    pub optimized_cv: String,
    pub job_description: String,
    pub cv_skills: Vec<String>,
    pub job_skills: Vec<String>,
    pub matched_skills: Vec<String>,
    pub language: Language,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssistantOutcome {
    pub action: AssistantAction,
    pub updated_cv: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_skills: Option<UpdatedSkills>,
    pub explanation: String,
    pub sources: Vec<String>,
    pub agent_logs: Vec<String>,
}

pub struct AssistantAgent<'a> {
    pub llm: &'a LlmClient,
    pub params: &'a LlmParams,
    pub rag: &'a RagStore,
    pub embedder: &'a dyn Embedder,
    pub conversations: &'a ConversationStore,
}

impl AssistantAgent<'_> {
    pub async fn run(&self, input: &AssistantInput) -> Result<AssistantOutcome, LlmError> {
        let mut logs = Vec::new();

        let context = self.retrieve(input, &mut logs).await;
        let sources: Vec<String> = context
            .as_ref()
            .map(|c| c.cv_sources.iter().chain(&c.jd_sources).cloned().collect())
            .unwrap_or_default();

        let mut messages = vec![ChatMessage::system(system_prompt(input.language))];
        messages.extend(self.conversations.chat_messages(&input.session_id));
        messages.push(ChatMessage::user(user_prompt(input, context.as_ref())));

        let mut workspace = Workspace {
            cv: input.optimized_cv.clone(),
            job_description: input.job_description.clone(),
            cv_skills: input.cv_skills.clone(),
            job_skills: input.job_skills.clone(),
            ..Workspace::default()
        };
        let tool_ctx = ToolContext {
            llm: self.llm,
            params: self.params,
            embedder: Some(self.embedder),
            session: self.rag.session(&input.session_id),
        };
        let specs = tool_specs();
        let mut tool_errors: Vec<String> = Vec::new();
        let mut final_text: Option<String> = None;
        let mut last_text: Option<String> = None;

        for turn in 1..=MAX_TURNS {
            let reply = self.llm.chat(self.params, &messages, &specs).await?;

            if reply.tool_calls.is_empty() {
                final_text = Some(reply.text().unwrap_or_default().to_string());
                break;
            }
            if let Some(text) = reply.text() {
                last_text = Some(text.to_string());
            }

            messages.push(ChatMessage::assistant_tool_calls(
                reply.content.clone(),
                reply.tool_calls.clone(),
            ));

            for call in &reply.tool_calls {
                let name = call.function.name.as_str();
                let result = match execute(call, &mut workspace, &tool_ctx).await {
                    Ok(value) => {
                        info!(turn, tool = name, "assistant tool call succeeded");
                        logs.push(format!("✓ {name}"));
                        value
                    }
                    Err(e) => {
                        warn!(turn, tool = name, error = %e, "assistant tool call failed");
                        logs.push(format!("✗ {name}: {e}"));
                        tool_errors.push(e.to_string());
                        json!({"status": "error", "error": e.to_string()})
                    }
                };
                messages.push(ChatMessage::tool_result(call.id.clone(), result.to_string()));
            }
        }

        let mut explanation = match final_text {
            Some(text) => text,
            None => {
                warn!(max_turns = MAX_TURNS, "assistant stopped at the turn limit");
                logs.push(format!("✗ Stopped after {MAX_TURNS} model turns"));
                last_text.unwrap_or_else(|| STEP_LIMIT_MESSAGE.to_string())
            }
        };
        if !tool_errors.is_empty() {
            explanation = format!("{explanation}\n\n⚠️ Tool error: {}", tool_errors.join("; "));
        }

        self.conversations
            .append_exchange(&input.session_id, &input.request, &explanation);

        let action = AssistantAction::from_flags(workspace.cv_changed, workspace.skills_changed);
        info!(session = %input.session_id, ?action, "assistant request handled");

        Ok(AssistantOutcome {
            action,
            updated_skills: workspace.updated_skills(),
            updated_cv: workspace.cv,
            explanation,
            sources,
            agent_logs: logs,
        })
    }

    /// Retrieval is best effort: a failure is logged and the request runs without context.
    async fn retrieve(
        &self,
        input: &AssistantInput,
        logs: &mut Vec<String>,
    ) -> Option<RetrievedContext> {
        match self
            .rag
            .retrieve(
                &input.session_id,
                &input.request,
                RETRIEVE_K_CV,
                RETRIEVE_K_JD,
                self.embedder,
            )
            .await
        {
            Ok(context) if context.is_empty() => None,
            Ok(context) => {
                logs.push(format!(
                    "✓ Retrieved {} CV and {} job description chunks",
                    context.cv_sources.len(),
                    context.jd_sources.len()
                ));
                Some(context)
            }
            Err(e) => {
                warn!(session = %input.session_id, error = %e, "assistant retrieval failed");
                logs.push(format!("✗ RAG retrieval failed: {e}"));
                None
            }
        }
    }
}

pub fn system_prompt(language: Language) -> String {
    fill_template(ASSISTANT_SYSTEM, &[("language", language.prompt_name())])
}

fn excerpt(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(DOCUMENT_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items
            .iter()
            .take(PROMPT_SKILLS)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn user_prompt(input: &AssistantInput, context: Option<&RetrievedContext>) -> String {
    let rag_context = context
        .map(|c| {
            fill_template(
                RAG_CONTEXT,
                &[
                    ("cv_context", c.cv_context.as_str()),
                    ("jd_context", c.jd_context.as_str()),
                ],
            )
        })
        .unwrap_or_default();

    let documents_context =
        if input.original_cv.trim().is_empty() && input.job_description.trim().is_empty() {
            String::new()
        } else {
            fill_template(
                DOCUMENTS_CONTEXT,
                &[
                    ("original_cv", excerpt(&input.original_cv).as_str()),
                    ("job_description", excerpt(&input.job_description).as_str()),
                ],
            )
        };

    let skills_context = if input.cv_skills.is_empty()
        && input.job_skills.is_empty()
        && input.matched_skills.is_empty()
    {
        String::new()
    } else {
        fill_template(
            SKILLS_CONTEXT,
            &[
                ("cv_skills", list_or_none(&input.cv_skills).as_str()),
                ("job_skills", list_or_none(&input.job_skills).as_str()),
                ("matched_skills", list_or_none(&input.matched_skills).as_str()),
            ],
        )
    };

    fill_template(
        ASSISTANT_USER,
        &[
            ("rag_context", rag_context.as_str()),
            ("documents_context", documents_context.as_str()),
            ("skills_context", skills_context.as_str()),
            ("optimized_cv", input.optimized_cv.as_str()),
            ("user_request", input.request.as_str()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::rag::embedder::testing::{FailingEmbedder, VocabularyEmbedder};
    use crate::test_support::{chat_text, chat_tool_call};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CV: &str = "JANE DOE\n\nSKILLS\nRust and Go\n\nEXPERIENCE\nAcme - Backend engineer";

    fn input(request: &str) -> AssistantInput {
        AssistantInput {
            request: request.to_string(),
            original_cv: "Jane Doe, Rust developer at Acme".to_string(),
            optimized_cv: CV.to_string(),
            job_description: "Rust and Kubernetes platform role".to_string(),
            cv_skills: vec!["Rust".to_string(), "Go".to_string()],
            job_skills: vec![],
            matched_skills: vec![],
            language: Language::English,
            session_id: "s1".to_string(),
        }
    }

    /// Mounts `first` for the first chat call only and `rest` for every later call.
    async fn mount_sequence(server: &MockServer, first: ResponseTemplate, rest: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(first)
            .up_to_n_times(1)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(rest)
            .mount(server)
            .await;
    }

    struct Harness {
        llm: LlmClient,
        params: LlmParams,
        rag: RagStore,
        conversations: ConversationStore,
    }

    impl Harness {
        fn new(server: &MockServer) -> Self {
            let llm = LlmClient::new(&Config::for_tests(&server.uri())).unwrap();
            let params = llm.params(Some("sk-test"), None, 0.7).unwrap();
            Self {
                llm,
                params,
                rag: RagStore::new(),
                conversations: ConversationStore::new(),
            }
        }

        fn agent<'a>(&'a self, embedder: &'a dyn Embedder) -> AssistantAgent<'a> {
            AssistantAgent {
                llm: &self.llm,
                params: &self.params,
                rag: &self.rag,
                embedder,
                conversations: &self.conversations,
            }
        }
    }

    #[test]
    fn test_action_from_flags() {
        assert_eq!(AssistantAction::from_flags(true, true), AssistantAction::UpdateBoth);
        assert_eq!(AssistantAction::from_flags(true, false), AssistantAction::UpdateCv);
        assert_eq!(AssistantAction::from_flags(false, true), AssistantAction::UpdateSkills);
        assert_eq!(AssistantAction::from_flags(false, false), AssistantAction::NoChange);
        assert_eq!(
            serde_json::to_value(AssistantAction::UpdateCv).unwrap(),
            "update_cv"
        );
    }

    #[test]
    fn test_prompts_carry_language_and_skills() {
        assert!(system_prompt(Language::Spanish).contains("Answer in Spanish (Español)"));

        let prompt = user_prompt(&input("add Kubernetes"), None);
        assert!(prompt.contains("User Request: add Kubernetes"));
        assert!(prompt.contains("CV skills: Rust, Go"));
        assert!(prompt.contains("Job skills: None"));
        assert!(!prompt.contains("semantic search"));
    }

    #[tokio::test]
    async fn test_tool_call_updates_cv() {
        let server = MockServer::start().await;
        mount_sequence(
            &server,
            chat_tool_call(
                "call_1",
                "update_cv_section",
                json!({"section_name": "Skills", "new_content": "Rust, Go, Kubernetes"}),
            ),
            chat_text("I added Kubernetes to your Skills section."),
        )
        .await;
        let h = Harness::new(&server);
        let embedder = VocabularyEmbedder::new(&["rust"]);

        let outcome = h.agent(&embedder).run(&input("add Kubernetes")).await.unwrap();

        assert_eq!(outcome.action, AssistantAction::UpdateCv);
        assert!(outcome.updated_cv.contains("Rust, Go, Kubernetes"));
        assert!(!outcome.updated_cv.contains("Rust and Go"));
        assert_eq!(outcome.explanation, "I added Kubernetes to your Skills section.");
        assert!(outcome.updated_skills.is_none());
        assert_eq!(outcome.agent_logs, vec!["✓ update_cv_section"]);
        assert!(outcome.sources.is_empty());
        assert_eq!(embedder.calls(), 0, "no index, no retrieval");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        let second = String::from_utf8_lossy(&requests[1].body);
        assert!(second.contains("\"tool_call_id\":\"call_1\""));
        assert!(second.contains("section_found"));

        let history = h.conversations.history("s1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "add Kubernetes");
    }

    #[tokio::test]
    async fn test_plain_answer_is_no_change() {
        let server = MockServer::start().await;
        mount_sequence(
            &server,
            chat_text("Your CV already lists Rust."),
            chat_text("unused"),
        )
        .await;
        let h = Harness::new(&server);

        let outcome = h
            .agent(&FailingEmbedder)
            .run(&input("does my CV mention Rust?"))
            .await
            .unwrap();

        assert_eq!(outcome.action, AssistantAction::NoChange);
        assert_eq!(outcome.updated_cv, CV);
        assert_eq!(outcome.explanation, "Your CV already lists Rust.");
    }

    #[tokio::test]
    async fn test_first_turn_quotes_original_cv_and_job_description() {
        let server = MockServer::start().await;
        mount_sequence(&server, chat_text("Summary aligned."), chat_text("unused")).await;
        let h = Harness::new(&server);
        let mut request = input("align my summary with the posting");
        request.job_description = format!("Platform role. {}", "x".repeat(600));

        h.agent(&FailingEmbedder).run(&request).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let user_turn = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m["role"] == "user")
            .and_then(|m| m["content"].as_str())
            .unwrap()
            .to_string();

        assert!(user_turn.contains("Original CV: Jane Doe, Rust developer at Acme"));
        assert!(user_turn.contains("Job description: Platform role."));
        let quoted = format!("Platform role. {}...", "x".repeat(500 - "Platform role. ".len()));
        assert!(user_turn.contains(&quoted));
        assert!(!user_turn.contains(&"x".repeat(501)));
    }

    #[tokio::test]
    async fn test_tool_error_is_reported_and_appended() {
        let server = MockServer::start().await;
        mount_sequence(
            &server,
            chat_tool_call("call_9", "delete_everything", json!({})),
            chat_text("I could not do that."),
        )
        .await;
        let h = Harness::new(&server);

        let outcome = h.agent(&FailingEmbedder).run(&input("wipe it")).await.unwrap();

        assert_eq!(outcome.action, AssistantAction::NoChange);
        assert_eq!(
            outcome.explanation,
            "I could not do that.\n\n⚠️ Tool error: unknown tool 'delete_everything'"
        );
        let requests = server.received_requests().await.unwrap();
        let second = String::from_utf8_lossy(&requests[1].body);
        assert!(second.contains("unknown tool"));
    }

    #[tokio::test]
    async fn test_turn_limit_stops_the_loop() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(chat_tool_call("call_x", "search_cv", json!({"search_term": "rust"})))
            .mount(&server)
            .await;
        let h = Harness::new(&server);

        let outcome = h.agent(&FailingEmbedder).run(&input("loop forever")).await.unwrap();

        assert_eq!(server.received_requests().await.unwrap().len(), MAX_TURNS);
        assert_eq!(outcome.explanation, STEP_LIMIT_MESSAGE);
        assert_eq!(outcome.action, AssistantAction::NoChange);
        assert_eq!(
            outcome.agent_logs.last().map(String::as_str),
            Some("✗ Stopped after 5 model turns")
        );
    }

    #[tokio::test]
    async fn test_history_is_replayed() {
        let server = MockServer::start().await;
        mount_sequence(&server, chat_text("Sure."), chat_text("unused")).await;
        let h = Harness::new(&server);
        h.conversations
            .append_exchange("s1", "earlier question", "earlier answer");

        h.agent(&FailingEmbedder).run(&input("follow up")).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("earlier question"));
        assert!(body.contains("earlier answer"));
        assert_eq!(h.conversations.history("s1").len(), 4);
    }

    #[tokio::test]
    async fn test_retrieval_adds_context_and_sources() {
        let server = MockServer::start().await;
        mount_sequence(&server, chat_text("Noted."), chat_text("unused")).await;
        let h = Harness::new(&server);
        let embedder = VocabularyEmbedder::new(&["rust", "kubernetes"]);
        h.rag
            .index_cv("s1", "Built Rust services at Acme.", &embedder)
            .await
            .unwrap();

        let outcome = h
            .agent(&embedder)
            .run(&input("highlight rust"))
            .await
            .unwrap();

        assert_eq!(outcome.sources, vec!["Built Rust services at Acme."]);
        assert!(outcome.agent_logs[0].starts_with("✓ Retrieved 1 CV"));
        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("Relevant context from semantic search"));
        assert!(body.contains("[Chunk 1]: Built Rust services at Acme."));
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_not_fatal() {
        let server = MockServer::start().await;
        mount_sequence(&server, chat_text("Done."), chat_text("unused")).await;
        let h = Harness::new(&server);
        let indexing = VocabularyEmbedder::new(&["rust"]);
        h.rag.index_cv("s1", "Rust", &indexing).await.unwrap();

        let outcome = h.agent(&FailingEmbedder).run(&input("anything")).await.unwrap();

        assert_eq!(outcome.explanation, "Done.");
        assert!(outcome.agent_logs[0].starts_with("✗ RAG retrieval failed"));
    }

    #[tokio::test]
    async fn test_provider_error_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "Rate limit reached", "code": "rate_limit_exceeded"}
            })))
            .mount(&server)
            .await;
        let h = Harness::new(&server);

        let err = h.agent(&FailingEmbedder).run(&input("hi")).await.unwrap_err();
        assert_eq!(
            err.failure(),
            crate::llm_client::failure::ProviderFailure::RateLimited
        );
        assert!(h.conversations.history("s1").is_empty());
    }
}
