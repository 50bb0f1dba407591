use crate::agent::SqlAgent;
use crate::db::SqlExecutor;
use crate::error::Result;
use crate::extract::{SqlExtractor, SQL_NOT_FOUND};
use crate::types::{error_row, ConversationTurn, QueryResult};
use itertools::Itertools;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Most recent turns carried into the context blob.
const HISTORY_WINDOW: usize = 6;

/// Everything one question needs, built once at startup and shared by
/// reference: the reasoning agent and the executor used for the independent
/// re-run.
pub struct Orchestrator {
    agent: Arc<dyn SqlAgent>,
    executor: Arc<dyn SqlExecutor>,
    extractor: SqlExtractor,
}

impl Orchestrator {
    pub fn new(agent: Arc<dyn SqlAgent>, executor: Arc<dyn SqlExecutor>) -> Self {
        Self {
            agent,
            executor,
            extractor: SqlExtractor::new(),
        }
    }

    /// Swaps in a differently configured extractor (e.g. first-statement
    /// mode).
    pub fn with_extractor(mut self, extractor: SqlExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Runs one question end to end: context blob, agent run, SQL scrape,
    /// independent re-execution, packaged record.
    ///
    /// Agent faults propagate as errors. Re-execution faults do not: they are
    /// folded into the result rows so the narrative still reaches the caller.
    pub async fn handle_question(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<QueryResult> {
        let question_id = Uuid::new_v4();
        info!("[{}] Handling question: {}", question_id, question);

        let context = build_context(question, history);
        let answer = self.agent.answer(&context).await?;
        debug!("[{}] Agent replied with {} chars", question_id, answer.len());

        let query = self.extractor.extract(&answer);
        let result = if query == SQL_NOT_FOUND {
            debug!("[{}] No SQL found in agent reply", question_id);
            Vec::new()
        } else {
            // Re-run the scraped SQL ourselves so the caller gets structured
            // rows decoupled from whatever the agent executed internally.
            match self.executor.run(&query).await {
                Ok(rows) => rows,
                Err(e) => {
                    warn!("[{}] Re-execution failed: {}", question_id, e);
                    vec![error_row(&e.to_string())]
                }
            }
        };

        info!("[{}] Done, {} row(s)", question_id, result.len());
        Ok(QueryResult {
            query,
            result,
            answer,
        })
    }
}

/// Renders the question with up to the last [`HISTORY_WINDOW`] turns ahead
/// of it. With no history the question passes through bare.
pub fn build_context(question: &str, history: &[ConversationTurn]) -> String {
    if history.is_empty() {
        return question.to_string();
    }

    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let turns = history[start..]
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .join("\n");

    format!(
        "Conversation history:\n{}\n\nUser question: {}",
        turns, question
    )
}
