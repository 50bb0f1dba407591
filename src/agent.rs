use crate::db::SqlExecutor;
use crate::error::{AskdbError, Result};
use crate::llm::{ChatMessage, LlmClient, ToolDefinition};
use crate::prompts;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reasoning/tool round trips allowed per question before the run is
/// abandoned.
const MAX_TOOL_STEPS: usize = 8;

/// A reasoning engine that answers a question blob as free-form text, running
/// SQL through its executor along the way as it sees fit. Callers learn
/// nothing about how many queries it ran or in what order.
#[async_trait]
pub trait SqlAgent: Send + Sync {
    async fn answer(&self, context: &str) -> Result<String>;
}

/// [`SqlAgent`] backed by a chat-completions model with an `execute_sql`
/// tool. The model gets the SQL-generation instructions plus the schema
/// catalog, then loops tool-call/observation until it replies with text.
pub struct GeminiSqlAgent {
    llm: LlmClient,
    executor: Arc<dyn SqlExecutor>,
    table_info: String,
}

impl GeminiSqlAgent {
    pub fn new(llm: LlmClient, executor: Arc<dyn SqlExecutor>, table_info: String) -> Self {
        Self {
            llm,
            executor,
            table_info,
        }
    }

    fn tool_definitions() -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: "execute_sql".to_string(),
            description: "Execute a SQL query against the MySQL database and return the resulting rows as JSON.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "sql": {
                        "type": "string",
                        "description": "The SQL statement to execute"
                    }
                },
                "required": ["sql"]
            }),
        }]
    }

    async fn run_tool(&self, name: &str, args: &Value) -> String {
        match name {
            "execute_sql" => {
                let sql = args.get("sql").and_then(|v| v.as_str()).unwrap_or("");
                debug!("Agent running SQL: {}", sql);
                match self.executor.run(sql).await {
                    Ok(rows) => {
                        let preview: Vec<&Value> =
                            rows.iter().take(prompts::RESULT_PREVIEW_ROWS).collect();
                        serde_json::to_string(&preview).unwrap_or_else(|_| "[]".to_string())
                    }
                    // Failures go back as observation text, not as a fault.
                    Err(e) => format!("Query failed: {}", e),
                }
            }
            other => format!("Unknown tool '{}'", other),
        }
    }
}

#[async_trait]
impl SqlAgent for GeminiSqlAgent {
    async fn answer(&self, context: &str) -> Result<String> {
        let tools = Self::tool_definitions();
        let mut messages = vec![
            ChatMessage::system(
                "You are a database assistant. Use the execute_sql tool to run queries against \
                 the database whenever you need real data to answer.",
            ),
            ChatMessage::user(prompts::sql_generation_prompt(&self.table_info, context)),
        ];

        for step in 1..=MAX_TOOL_STEPS {
            let reply = self.llm.chat(&messages, &tools).await?;
            let tool_calls = reply.tool_calls.clone().unwrap_or_default();

            if tool_calls.is_empty() {
                let text = reply.content.unwrap_or_default();
                if text.trim().is_empty() {
                    return Err(AskdbError::Llm("Agent returned an empty reply".to_string()));
                }
                debug!("Agent finished after {} step(s)", step);
                return Ok(text);
            }

            messages.push(reply);
            for call in &tool_calls {
                let args: Value = serde_json::from_str(&call.function.arguments)
                    .unwrap_or_else(|e| {
                        warn!("Malformed tool arguments from model: {}", e);
                        Value::Null
                    });
                let observation = self.run_tool(&call.function.name, &args).await;
                messages.push(ChatMessage::tool(&call.id, observation));
            }
        }

        Err(AskdbError::Llm(format!(
            "Agent did not produce a final answer within {} tool steps",
            MAX_TOOL_STEPS
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedRowsExecutor {
        rows: Vec<Value>,
        fail: Option<String>,
    }

    #[async_trait]
    impl SqlExecutor for FixedRowsExecutor {
        async fn run(&self, _sql: &str) -> Result<Vec<Value>> {
            match &self.fail {
                Some(message) => Err(AskdbError::Execution(message.clone())),
                None => Ok(self.rows.clone()),
            }
        }
    }

    fn agent_with(executor: FixedRowsExecutor) -> GeminiSqlAgent {
        GeminiSqlAgent::new(
            LlmClient::new("k".to_string(), "m".to_string(), "http://localhost".to_string()),
            Arc::new(executor),
            "- users: accounts".to_string(),
        )
    }

    #[tokio::test]
    async fn tool_observation_is_row_json() {
        let agent = agent_with(FixedRowsExecutor {
            rows: vec![json!({"id": 1}), json!({"id": 2})],
            fail: None,
        });
        let observation = agent
            .run_tool("execute_sql", &json!({"sql": "SELECT id FROM users"}))
            .await;
        assert_eq!(observation, r#"[{"id":1},{"id":2}]"#);
    }

    #[tokio::test]
    async fn tool_observation_caps_rows() {
        let rows: Vec<_> = (0..30).map(|i| json!({"n": i})).collect();
        let agent = agent_with(FixedRowsExecutor { rows, fail: None });
        let observation = agent
            .run_tool("execute_sql", &json!({"sql": "SELECT n FROM t"}))
            .await;
        assert!(observation.contains(r#"{"n":19}"#));
        assert!(!observation.contains(r#"{"n":20}"#));
    }

    #[tokio::test]
    async fn failed_query_becomes_observation_text() {
        let agent = agent_with(FixedRowsExecutor {
            rows: vec![],
            fail: Some("Table 'shop.user' doesn't exist".to_string()),
        });
        let observation = agent
            .run_tool("execute_sql", &json!({"sql": "SELECT * FROM user"}))
            .await;
        assert!(observation.starts_with("Query failed:"));
        assert!(observation.contains("shop.user"));
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_to_the_model() {
        let agent = agent_with(FixedRowsExecutor {
            rows: vec![],
            fail: None,
        });
        let observation = agent.run_tool("drop_database", &Value::Null).await;
        assert_eq!(observation, "Unknown tool 'drop_database'");
    }
}
