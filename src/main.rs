use askdb::agent::GeminiSqlAgent;
use askdb::catalog;
use askdb::config::Config;
use askdb::db::{MySqlExecutor, SqlExecutor};
use askdb::llm::LlmClient;
use askdb::orchestrator::Orchestrator;
use askdb::session::ChatSession;
use askdb::types::QueryResult;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "askdb")]
#[command(about = "Chat with a MySQL database in plain English")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session against the database
    Chat {
        /// Path to the table catalog CSV (default: ./table_details.csv)
        #[arg(short, long, default_value = "table_details.csv")]
        catalog: PathBuf,
    },
    /// Ask a single question and exit
    Ask {
        /// The question in natural language
        question: String,

        /// Path to the table catalog CSV (default: ./table_details.csv)
        #[arg(short, long, default_value = "table_details.csv")]
        catalog: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt::init();

    let args = Args::parse();

    match args.command {
        Commands::Chat { catalog } => run_chat(&catalog).await,
        Commands::Ask { question, catalog } => run_ask(&question, &catalog).await,
    }
}

async fn build_session(catalog_path: &Path) -> Result<ChatSession> {
    let config = Config::from_env()?;

    let table_info = catalog::load(catalog_path);
    if table_info.is_empty() {
        info!("No table catalog loaded, SQL generation runs without schema hints");
    }

    let executor: Arc<dyn SqlExecutor> = Arc::new(MySqlExecutor::connect(&config.db_uri).await?);
    let llm = LlmClient::new(config.api_key, config.model, config.base_url);
    let agent = Arc::new(GeminiSqlAgent::new(llm, executor.clone(), table_info));

    Ok(ChatSession::new(Orchestrator::new(agent, executor)))
}

async fn run_chat(catalog_path: &Path) -> Result<()> {
    let mut session = build_session(catalog_path).await?;

    println!("Connected. Ask about your data.");
    println!("Commands: 'exit' or 'quit' to leave, '/clear' to reset the conversation.");

    loop {
        print!("\n> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }
        if input == "/clear" {
            session.clear();
            println!("Conversation cleared.");
            continue;
        }

        let record = session.ask(input).await;
        print_result(&record);
    }

    Ok(())
}

async fn run_ask(question: &str, catalog_path: &Path) -> Result<()> {
    let mut session = build_session(catalog_path).await?;
    let record = session.ask(question).await;
    print_result(&record);
    Ok(())
}

fn print_result(record: &QueryResult) {
    println!("\n{}", "=".repeat(80));
    println!("Generated SQL");
    println!("{}", "-".repeat(80));
    println!("{}", record.query);

    println!("\nQuery result");
    println!("{}", "-".repeat(80));
    println!(
        "{}",
        serde_json::to_string_pretty(&record.result).unwrap_or_else(|_| "[]".to_string())
    );

    println!("\nAnswer");
    println!("{}", "-".repeat(80));
    println!("{}", record.answer);
    println!("{}", "=".repeat(80));
}
