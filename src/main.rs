use analyzer::PaymentAnalyzer;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use configuration::{LogLevel, Settings};
use core_types::{QueryResult, ScalarValue};
use database::{CustomerPaymentSummary, DbRepository};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

/// The main entry point for the Pagila toolkit.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the variables may be set elsewhere.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut settings = configuration::load_settings()?;
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }
    let _guard = configuration::init_tracing(&settings.logging)?;

    match cli.command {
        Commands::Serve(args) => handle_serve(args, settings).await,
        Commands::Schema => handle_schema(&settings).await,
        Commands::Diagram => handle_diagram(&settings).await,
        Commands::Payments(args) => handle_payments(args, &settings).await,
        Commands::Query(args) => handle_query(args, &settings).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Schema reflection, diagrams, payment analysis and ad-hoc queries over the
/// Pagila DVD rental database.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Overrides the configured log level.
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API.
    Serve(ServeArgs),
    /// Print the reflected schema as JSON.
    Schema,
    /// Print the schema as a Mermaid ER diagram.
    Diagram,
    /// Show the highest and lowest paying customers.
    Payments(PaymentsArgs),
    /// Run a statement with `:name` parameters. Writes are rolled back.
    Query(QueryArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Address to bind (e.g., "127.0.0.1:8000"). Defaults to the configured host and port.
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[derive(Parser)]
struct PaymentsArgs {
    /// How many customers to show at each end of the ranking.
    #[arg(long)]
    top: Option<usize>,
}

#[derive(Parser)]
struct QueryArgs {
    /// The statement to run.
    statement: String,

    /// A bound parameter as NAME=VALUE. VALUE is read as a JSON scalar when it
    /// parses as one, otherwise as text.
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, ScalarValue)>,
}

fn parse_param(raw: &str) -> Result<(String, ScalarValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("parameter name missing in '{raw}'"));
    }

    let scalar = serde_json::from_str::<JsonValue>(value)
        .ok()
        .and_then(|json| ScalarValue::from_json(name, json).ok())
        .unwrap_or_else(|| ScalarValue::Text(value.to_string()));
    Ok((name.to_string(), scalar))
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_serve(args: ServeArgs, mut settings: Settings) -> anyhow::Result<()> {
    if let Some(addr) = args.addr {
        settings.server.host = addr.ip().to_string();
        settings.server.port = addr.port();
    }
    web_server::run_server(&settings).await
}

async fn repository(settings: &Settings) -> anyhow::Result<DbRepository> {
    let pool = database::connect(&settings.database).await?;
    Ok(DbRepository::new(pool, settings.database.schema.clone()))
}

fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

async fn reflect(settings: &Settings) -> anyhow::Result<core_types::SchemaModel> {
    let db_repo = repository(settings).await?;
    let pb = spinner(&format!("Reflecting schema '{}'...", db_repo.schema()))?;
    let model = db_repo.reflect_schema().await;
    pb.finish_and_clear();
    Ok(model?)
}

async fn handle_schema(settings: &Settings) -> anyhow::Result<()> {
    let model = reflect(settings).await?;
    println!("{}", serde_json::to_string_pretty(&model)?);
    Ok(())
}

async fn handle_diagram(settings: &Settings) -> anyhow::Result<()> {
    let model = reflect(settings).await?;
    println!("{}", diagram::render(&model));
    Ok(())
}

async fn handle_payments(args: PaymentsArgs, settings: &Settings) -> anyhow::Result<()> {
    let top_count = args.top.unwrap_or(settings.analysis.default_top_count);
    let db_repo = repository(settings).await?;
    let analysis = PaymentAnalyzer::new().run(&db_repo, top_count).await?;

    println!("Top {top_count} customers by total paid");
    println!("{}", payment_table(&analysis.top_customers));
    println!("Bottom {top_count} customers by total paid");
    println!("{}", payment_table(&analysis.bottom_customers));
    Ok(())
}

async fn handle_query(args: QueryArgs, settings: &Settings) -> anyhow::Result<()> {
    let params: HashMap<String, ScalarValue> = args.params.into_iter().collect();
    let db_repo = repository(settings).await?;
    let result = db_repo
        .ad_hoc_executor()
        .execute(&args.statement, &params)
        .await?;

    if result.is_empty() {
        println!("(no rows)");
    } else {
        println!("{}", result_table(&result));
        println!("({} rows)", result.len());
    }
    Ok(())
}

// ==============================================================================
// Rendering
// ==============================================================================

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn payment_table(customers: &[CustomerPaymentSummary]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Customer", "First Name", "Last Name", "Total Paid", "Payments"]);
    for c in customers {
        table.add_row(vec![
            c.customer_id.to_string(),
            c.first_name.clone(),
            c.last_name.clone(),
            c.total_paid.to_string(),
            c.payment_count.to_string(),
        ]);
    }
    table
}

fn result_table(result: &QueryResult) -> Table {
    let mut table = new_table();
    let Some(first) = result.rows().first() else {
        return table;
    };
    table.set_header(first.columns().collect::<Vec<_>>());
    for row in result.rows() {
        table.add_row(row.iter().map(|(_, value)| value.to_string()).collect::<Vec<_>>());
    }
    table
}
