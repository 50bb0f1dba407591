use askdb::agent::SqlAgent;
use askdb::db::SqlExecutor;
use askdb::error::{AskdbError, Result as AskdbResult};
use askdb::extract::SQL_NOT_FOUND;
use askdb::orchestrator::Orchestrator;
use askdb::session::ChatSession;
use askdb::types::ERROR_KEY;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Agent double that always replies with the same canned text, or always
/// fails, depending on how it was built.
struct ScriptedAgent {
    reply: String,
    fail: bool,
}

impl ScriptedAgent {
    fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            reply: String::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl SqlAgent for ScriptedAgent {
    async fn answer(&self, _context: &str) -> AskdbResult<String> {
        if self.fail {
            return Err(AskdbError::Llm("model unavailable".to_string()));
        }
        Ok(self.reply.clone())
    }
}

/// Agent double that records every context string it is handed.
struct RecordingAgent {
    seen: Mutex<Vec<String>>,
}

impl RecordingAgent {
    fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
        }
    }

    fn contexts(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlAgent for RecordingAgent {
    async fn answer(&self, context: &str) -> AskdbResult<String> {
        self.seen.lock().unwrap().push(context.to_string());
        Ok("There are 5 tables in the database.".to_string())
    }
}

/// Executor double that serves fixed rows (or a fixed failure) and records
/// every statement it was asked to run.
struct StubExecutor {
    rows: Vec<Value>,
    fail_message: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl StubExecutor {
    fn returning(rows: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            rows,
            fail_message: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            rows: Vec::new(),
            fail_message: Some(message.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlExecutor for StubExecutor {
    async fn run(&self, sql: &str) -> AskdbResult<Vec<Value>> {
        self.calls.lock().unwrap().push(sql.to_string());
        match &self.fail_message {
            Some(message) => Err(AskdbError::Execution(message.clone())),
            None => Ok(self.rows.clone()),
        }
    }
}

const AGENT_SQL_AND_PROSE: &str = "SELECT u.id FROM users AS u JOIN orders AS o ON u.id = o.user_id \
     GROUP BY u.id HAVING COUNT(o.id) > 3; Users with more than 3 orders are shown above.";

#[tokio::test]
async fn full_pipeline_reexecutes_extracted_sql() -> Result<(), Box<dyn std::error::Error>> {
    let agent_text = format!("Here is the result of my analysis: {}", AGENT_SQL_AND_PROSE);
    let executor = StubExecutor::returning(vec![json!({"id": 1})]);
    let orchestrator = Orchestrator::new(
        Arc::new(ScriptedAgent::replying(&agent_text)),
        executor.clone(),
    );

    let record = orchestrator
        .handle_question("Which users have more than 3 orders?", &[])
        .await?;

    // The scraped statement runs from the first SQL keyword to the end of the
    // reply, trailing prose included.
    assert_eq!(record.query, AGENT_SQL_AND_PROSE);
    assert_eq!(record.result, vec![json!({"id": 1})]);
    assert_eq!(record.answer, agent_text);
    assert_eq!(executor.calls(), vec![AGENT_SQL_AND_PROSE.to_string()]);
    Ok(())
}

#[tokio::test]
async fn reply_without_sql_yields_sentinel_and_no_execution() -> Result<(), Box<dyn std::error::Error>>
{
    let executor = StubExecutor::returning(vec![json!({"id": 1})]);
    let orchestrator = Orchestrator::new(
        Arc::new(ScriptedAgent::replying(
            "I need more detail about the date range you mean.",
        )),
        executor.clone(),
    );

    let record = orchestrator.handle_question("How did sales do?", &[]).await?;

    assert_eq!(record.query, SQL_NOT_FOUND);
    assert!(record.result.is_empty());
    assert!(executor.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_reexecution_keeps_the_narrative() -> Result<(), Box<dyn std::error::Error>> {
    let agent_text = "SELECT * FROM user LIMIT 5";
    let executor = StubExecutor::failing("Table 'shop.user' doesn't exist");
    let orchestrator = Orchestrator::new(
        Arc::new(ScriptedAgent::replying(agent_text)),
        executor.clone(),
    );

    let record = orchestrator.handle_question("Show me some users", &[]).await?;

    assert_eq!(record.query, agent_text);
    assert_eq!(record.result.len(), 1);
    let detail = record.result[0][ERROR_KEY].as_str().unwrap_or_default();
    assert!(
        detail.contains("Table 'shop.user' doesn't exist"),
        "got: {detail}"
    );
    // A failed re-run only marks the rows; the narrative answer stays intact.
    assert_eq!(record.answer, agent_text);
    assert!(!record.answer.starts_with("Error:"));
    Ok(())
}

#[tokio::test]
async fn agent_fault_becomes_error_record() {
    let executor = StubExecutor::returning(Vec::new());
    let mut session = ChatSession::new(Orchestrator::new(
        Arc::new(ScriptedAgent::failing()),
        executor,
    ));

    let record = session.ask("How many tables are there?").await;

    assert_eq!(record.query, "");
    let detail = record.result[0][ERROR_KEY].as_str().unwrap_or_default();
    assert!(detail.contains("model unavailable"), "got: {detail}");
    assert!(record.answer.starts_with("Error: "));
    assert!(record.answer.contains("model unavailable"));
    // Both turns still land in the history so the conversation can continue.
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.history()[1].content, record.answer);
}

#[tokio::test]
async fn context_window_covers_the_running_conversation() {
    let agent = Arc::new(RecordingAgent::new());
    let executor = StubExecutor::returning(Vec::new());
    let mut session = ChatSession::new(Orchestrator::new(agent.clone(), executor));

    for question in ["alpha", "bravo", "charlie", "delta"] {
        session.ask(question).await;
    }

    let contexts = agent.contexts();
    assert_eq!(contexts.len(), 4);
    // The user turn is appended before the agent runs, so the very first
    // context already carries it.
    assert_eq!(
        contexts[0],
        "Conversation history:\nuser: alpha\n\nUser question: alpha"
    );
    // By the fourth question the oldest turn has rolled out of the window.
    assert!(!contexts[3].contains("alpha"));
    assert!(contexts[3].contains("user: bravo"));
    assert!(contexts[3].contains("assistant: There are 5 tables in the database."));
    assert!(contexts[3].ends_with("User question: delta"));
}

#[tokio::test]
async fn clear_starts_the_conversation_over() {
    let agent = Arc::new(RecordingAgent::new());
    let executor = StubExecutor::returning(Vec::new());
    let mut session = ChatSession::new(Orchestrator::new(agent.clone(), executor));

    session.ask("first question").await;
    assert_eq!(session.history().len(), 2);

    session.clear();
    assert!(session.history().is_empty());

    session.ask("second question").await;
    let contexts = agent.contexts();
    assert_eq!(
        contexts[1],
        "Conversation history:\nuser: second question\n\nUser question: second question"
    );
}
