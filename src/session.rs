use crate::orchestrator::Orchestrator;
use crate::types::{ConversationTurn, QueryResult};
use tracing::error;

/// One chat conversation. Owns the turn history and shields the caller from
/// agent faults by turning them into displayable records, so a bad turn never
/// ends the session.
pub struct ChatSession {
    orchestrator: Orchestrator,
    history: Vec<ConversationTurn>,
}

impl ChatSession {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Forgets the conversation so far. The next question starts fresh.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Runs one question through the orchestration. The user turn goes into
    /// the history before the question runs, so the context window already
    /// contains it. Both turns stay in the history whether the agent
    /// succeeded or not.
    pub async fn ask(&mut self, question: &str) -> QueryResult {
        self.history.push(ConversationTurn::user(question));

        let record = match self
            .orchestrator
            .handle_question(question, &self.history)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                error!("Agent invocation failed: {}", e);
                QueryResult::failed(&e.to_string())
            }
        };

        self.history.push(ConversationTurn::assistant(&record.answer));
        record
    }
}
