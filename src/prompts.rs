use itertools::Itertools;
use serde_json::Value;

/// Row cap applied whenever query results are shown to the model.
pub const RESULT_PREVIEW_ROWS: usize = 20;

/// Instruction block handed to the agent: schema context, output rules, two
/// worked examples, then the user's request.
pub fn sql_generation_prompt(table_info: &str, input: &str) -> String {
    format!(
        r#"You are a senior SQL developer.
You are given schema information for the database and must write a single, syntactically correct SQL query (MySQL dialect) that answers the user's request.

Rules:
- Use ONLY tables/columns that appear in the schema below.
- Do not invent tables or columns.
- Output ONLY the SQL (no explanation, no backticks).
- Always alias tables using the first letter of the table name (e.g., users AS u, orders AS o).
- If the question is ambiguous, pick the most reasonable interpretation.
- If the request does not require a query (e.g., "how many tables"), still return SQL that answers it.

Schema:
{}

# Few-shot examples:
Example 1:
Schema:
- users(id, name, email)
- orders(id, user_id, total)

Question: List all users who have placed more than 3 orders.
SQL: SELECT u.id, u.name, u.email
     FROM users AS u
     JOIN orders AS o ON u.id = o.user_id
     GROUP BY u.id
     HAVING COUNT(o.id) > 3;

Example 2:
Schema:
- employees(id, name, department_id, salary)
- departments(id, name)

Question: Show the average salary per department.
SQL: SELECT d.name, AVG(e.salary) AS avg_salary
     FROM employees AS e
     JOIN departments AS d ON e.department_id = d.id
     GROUP BY d.name;

Question:
{}

-- Return only the SQL query:
"#,
        table_info, input
    )
}

/// Instruction for turning an executed query into a short prose summary.
/// The question pipeline returns the agent's narrative untouched and never
/// sends this; it is here for callers that want a second-pass summary.
pub fn final_answer_prompt(question: &str, query: &str, rows: &[Value]) -> String {
    format!(
        r#"You are a helpful data analyst. Given the question, the SQL executed, and the query result, produce a concise, clear answer in plain English.

User question:
{}

SQL executed:
{}

Query result (first 20 rows shown as JSON-like):
{}

Now produce a short explanation (1-5 sentences) summarizing the result and mentioning any notable values, or say "No rows returned" if empty.
"#,
        question,
        query,
        render_result_preview(rows)
    )
}

/// First [`RESULT_PREVIEW_ROWS`] rows as one JSON object per line.
pub fn render_result_preview(rows: &[Value]) -> String {
    if rows.is_empty() {
        return "[]".to_string();
    }
    rows.iter()
        .take(RESULT_PREVIEW_ROWS)
        .map(|row| serde_json::to_string(row).unwrap_or_else(|_| "{}".to_string()))
        .join("\n")
}
