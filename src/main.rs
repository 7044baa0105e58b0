use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use stratforge::catalog::{BlockCatalog, Family, ParamSpec};
use stratforge::codegen::{self, EmitTarget};
use stratforge::config::{AppConfig, StoreKind};
use stratforge::db::PostgresTemplateStore;
use stratforge::models::{StrategyDraft, TemplateRecord};
use stratforge::persistence::{MemoryTemplateStore, RedisTemplateStore, TemplateStore};
use stratforge::runtime::{ExecutionRuntime, HttpRuntimeClient, RuntimeStatus};
use stratforge::session::{EditingSession, SaveError};
use stratforge::validation::{validate, Violation};

#[derive(Parser)]
#[command(name = "stratforge", version, about = "Compose, validate and emit block-based trading strategies")]
struct Cli {
    /// Template store backend (overrides STRATFORGE_STORE)
    #[arg(long, global = true, value_enum)]
    store: Option<StoreKind>,

    /// Owner id used for saves and listings (overrides STRATFORGE_OWNER_ID)
    #[arg(long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the block kinds offered by the catalog
    Catalog {
        /// Only show one family (indicator, condition, action)
        #[arg(long)]
        family: Option<Family>,
    },
    /// Validate a draft JSON file
    Validate { draft: PathBuf },
    /// Validate a draft and print (or write) the generated program
    Emit {
        draft: PathBuf,
        #[arg(long, default_value_t = EmitTarget::Python)]
        target: EmitTarget,
        /// Write to this file instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Validate, emit and store a draft as a template
    Save {
        draft: PathBuf,
        #[arg(long)]
        public: bool,
    },
    /// List the owner's templates, or public templates with --public
    List {
        #[arg(long)]
        public: bool,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show a template visible to the owner
    Show {
        id: String,
        /// Print the stored code instead of the document
        #[arg(long)]
        code: bool,
    },
    /// Delete one of the owner's templates
    Delete { id: String },
    /// Talk to the execution runtime
    Runtime {
        #[command(subcommand)]
        command: RuntimeCommand,
    },
}

#[derive(Subcommand)]
enum RuntimeCommand {
    Status,
    Start,
    Stop,
    Logs {
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    ClearLogs,
    /// Emit a draft and run it once on the runtime
    Deploy {
        draft: PathBuf,
        /// Comma-separated symbols
        #[arg(long, value_delimiter = ',', required = true)]
        symbols: Vec<String>,
        #[arg(long)]
        exchange: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(store) = cli.store {
        config.store = store;
    }
    if let Some(owner) = cli.owner {
        config.owner_id = owner;
    }
    setup_logging(&config.log_filter);

    let catalog = BlockCatalog::builtin();

    match cli.command {
        Command::Catalog { family } => print_catalog(catalog, family),
        Command::Validate { draft } => {
            let draft = read_draft(&draft)?;
            match validate(catalog, &draft) {
                Ok(definition) => {
                    println!(
                        "✅ {} is valid ({} blocks)",
                        definition.name(),
                        definition.blocks().len()
                    );
                    Ok(())
                }
                Err(violations) => fail_with(&violations),
            }
        }
        Command::Emit { draft, target, out } => {
            let draft = read_draft(&draft)?;
            let definition = match validate(catalog, &draft) {
                Ok(definition) => definition,
                Err(violations) => return fail_with(&violations),
            };
            let code = codegen::emit(&definition, target);
            match out {
                Some(path) => {
                    std::fs::write(&path, code)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!("Wrote {} program to {}", target, path.display());
                }
                None => print!("{}", code),
            }
            Ok(())
        }
        Command::Runtime { command } => run_runtime(&config, catalog, command).await,
        command => match config.store {
            StoreKind::Memory => {
                tracing::warn!("Using the in-memory store; nothing outlives this command");
                run_store(&MemoryTemplateStore::new(), &config, catalog, command).await
            }
            StoreKind::Redis => {
                let store = RedisTemplateStore::new(&config.redis_url).await?;
                run_store(&store, &config, catalog, command).await
            }
            StoreKind::Postgres => {
                let store = PostgresTemplateStore::new(&config.database_url_or_default()).await?;
                run_store(&store, &config, catalog, command).await
            }
        },
    }
}

fn setup_logging(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_draft(path: &Path) -> anyhow::Result<StrategyDraft> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("{} is not a valid draft", path.display()))
}

fn fail_with(violations: &[Violation]) -> anyhow::Result<()> {
    eprintln!("❌ {} validation problem(s):", violations.len());
    for violation in violations {
        eprintln!("  {}", violation);
    }
    bail!("draft is invalid")
}

fn describe(spec: &ParamSpec) -> String {
    match spec {
        ParamSpec::Number {
            default, min, max, ..
        } => {
            let bound = |b: &Option<f64>| b.map(|v| v.to_string()).unwrap_or_else(|| "..".into());
            format!(
                "{} = {} [{}, {}]",
                spec.type_name(),
                default,
                bound(min),
                bound(max)
            )
        }
        ParamSpec::Choice { default, allowed } => {
            format!("enum = {} ({})", default, allowed.join("|"))
        }
        ParamSpec::Bool { default } => format!("bool = {}", default),
    }
}

fn print_catalog(catalog: &BlockCatalog, family: Option<Family>) -> anyhow::Result<()> {
    let families = match family {
        Some(family) => vec![family],
        None => vec![Family::Indicator, Family::Condition, Family::Action],
    };

    for family in families {
        println!("\n{}s:", family);
        for kind in catalog.list(family) {
            println!("  {:<18} {}", kind.id().as_str(), kind.name());
            for decl in kind.parameters() {
                println!("      {:<16} {}", decl.name, describe(&decl.spec));
            }
        }
    }
    Ok(())
}

fn print_record_line(record: &TemplateRecord) {
    println!(
        "  {}  {:<28} {:<8} {}{}",
        record.id,
        record.name,
        record.exchange.as_str(),
        record.created_at.format("%Y-%m-%d %H:%M"),
        if record.is_public { "  (public)" } else { "" }
    );
}

async fn run_store<S: TemplateStore>(
    store: &S,
    config: &AppConfig,
    catalog: &BlockCatalog,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Save { draft, public } => {
            let draft = read_draft(&draft)?;
            let mut session = EditingSession::from_draft(catalog, &config.owner_id, draft);
            session.is_public = public;
            let record = match session.save(store).await {
                Ok(record) => record,
                Err(SaveError::Invalid(violations)) => return fail_with(&violations),
                Err(e) => return Err(e.into()),
            };
            println!("💾 Saved {} as {}", record.name, record.id);
        }
        Command::List { public, limit } => {
            let records = if public {
                store
                    .list_public(limit.unwrap_or(config.public_list_limit))
                    .await?
            } else {
                let mut owned = store.list_owned_by(&config.owner_id).await?;
                if let Some(limit) = limit {
                    owned.truncate(limit);
                }
                owned
            };
            println!("{} template(s)", records.len());
            for record in &records {
                print_record_line(record);
            }
        }
        Command::Show { id, code } => {
            let record = store.load(&id).await?;
            if !record.is_visible_to(&config.owner_id) {
                return Err(anyhow!("template {} is private to its owner", id));
            }
            if code {
                print!("{}", record.code);
            } else {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
        }
        Command::Delete { id } => {
            let mut session = EditingSession::new(catalog, &config.owner_id);
            session.delete(store, &id).await?;
            println!("🗑️  Deleted {}", id);
        }
        Command::Catalog { .. }
        | Command::Validate { .. }
        | Command::Emit { .. }
        | Command::Runtime { .. } => bail!("command does not use the template store"),
    }
    Ok(())
}

fn print_status(status: &RuntimeStatus) {
    println!("Status:            {:?}", status.state);
    if let Some(start) = &status.start_time {
        println!("Started:           {}", start);
    }
    if let Some(last) = &status.last_activity {
        println!("Last activity:     {}", last);
    }
    println!(
        "Trades:            {} ({} profitable)",
        status.total_trades, status.profitable_trades
    );
    println!("Total profit:      {:.2}", status.total_profit);
    println!("Balance:           {:.2}", status.current_balance);
}

async fn run_runtime(
    config: &AppConfig,
    catalog: &BlockCatalog,
    command: RuntimeCommand,
) -> anyhow::Result<()> {
    let runtime = HttpRuntimeClient::new(&config.runtime_url);

    match command {
        RuntimeCommand::Status => print_status(&runtime.status().await?),
        RuntimeCommand::Start => print_status(&runtime.start().await?),
        RuntimeCommand::Stop => print_status(&runtime.stop().await?),
        RuntimeCommand::Logs { limit } => {
            for entry in runtime.logs(limit).await? {
                println!("{} [{:?}] {}", entry.timestamp, entry.level, entry.message);
            }
        }
        RuntimeCommand::ClearLogs => {
            runtime.clear_logs().await?;
            println!("Logs cleared");
        }
        RuntimeCommand::Deploy {
            draft,
            symbols,
            exchange,
        } => {
            let draft = read_draft(&draft)?;
            let definition = match validate(catalog, &draft) {
                Ok(definition) => definition,
                Err(violations) => return fail_with(&violations),
            };
            let code = codegen::emit(&definition, EmitTarget::Python);
            let exchange = exchange.unwrap_or_else(|| definition.target_market().to_string());

            let report = runtime.submit_code(&code, &symbols, &exchange).await?;
            println!("🚀 {} ({:.2}s): {}", report.status, report.execution_time, report.message);
            println!("{}", serde_json::to_string_pretty(&report.result)?);
        }
    }
    Ok(())
}
