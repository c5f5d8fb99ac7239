use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::models::{AssistantMessage, ChatRequest, ChatRole, Citation};

/// Produces the assistant's reply to a chat request
#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn respond(&self, request: &ChatRequest) -> anyhow::Result<AssistantMessage>;
}

/// Answers every question with the same grounded reply.
#[derive(Debug, Default, Clone)]
pub struct CannedResponder;

impl CannedResponder {
    pub const ANSWER: &'static str = "Authentication is handled using JWT verification logic.";

    fn citation() -> Citation {
        Citation {
            path: "src/auth/jwt.ts".to_string(),
            start_line: 32,
            end_line: 78,
            symbol: Some("verifyToken".to_string()),
        }
    }
}

#[async_trait]
impl ChatResponder for CannedResponder {
    async fn respond(&self, request: &ChatRequest) -> anyhow::Result<AssistantMessage> {
        debug!(
            "Chat for {}: {:?}",
            request.repo_id,
            request.last_user_message()
        );
        Ok(AssistantMessage {
            role: ChatRole::Assistant,
            content: Self::ANSWER.to_string(),
            citations: vec![Self::citation()],
        })
    }
}

/// Responder that records the questions it was asked, for tests.
#[derive(Default)]
pub struct RecordingResponder {
    pub questions: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ChatResponder for RecordingResponder {
    async fn respond(&self, request: &ChatRequest) -> anyhow::Result<AssistantMessage> {
        let question = request.last_user_message().to_string();
        if let Ok(mut questions) = self.questions.lock() {
            questions.push(question.clone());
        }
        Ok(AssistantMessage {
            role: ChatRole::Assistant,
            content: format!("You asked: {question}"),
            citations: Vec::new(),
        })
    }
}
