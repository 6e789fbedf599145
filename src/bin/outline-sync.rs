use clap::{Parser, Subcommand, ValueEnum};
use outline_sync::config::{ConfigError, SyncConfig};
use outline_sync::core::mark::{Document, Violation};
use outline_sync::core::{OutlineNode, OutlineTree, ViewType};
use outline_sync::sync::{
    HostError, MemoryHost, Mutation, ParentRef, ReconcileError, ReconcileReport, apply_document,
    expected_blocks, plan, tree_to_document,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const PAGE_KEY: &str = "page";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Converts an outline tree snapshot into an annotated document
    Export {
        #[arg(long)]
        tree: PathBuf,
        /// View type for a page that sets none
        #[arg(long, value_enum)]
        view_type: Option<ViewArg>,
    },
    /// Reconciles an outline tree against a document
    Apply {
        #[arg(long)]
        tree: PathBuf,
        #[arg(long)]
        document: PathBuf,
        /// Print the planned mutations without applying them
        #[arg(long)]
        plan: bool,
        #[arg(long)]
        json: bool,
    },
    /// Checks a document's annotations
    Check {
        #[arg(long)]
        document: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    Bullet,
    Numbered,
    Document,
}

impl From<ViewArg> for ViewType {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::Bullet => ViewType::Bullet,
            ViewArg::Numbered => ViewType::Numbered,
            ViewArg::Document => ViewType::Document,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Host(#[from] HostError),
}

#[derive(Serialize)]
struct ApplyOutput {
    report: ReconcileReport,
    tree: OutlineTree,
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    valid: bool,
    violations: &'a [Violation],
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => fail(&err),
    };
    debug!(?config, "loaded settings");

    let result = match cli.command {
        Commands::Export { tree, view_type } => export_command(&tree, view_type, &config),
        Commands::Apply {
            tree,
            document,
            plan,
            json,
        } => apply_command(&tree, &document, plan, json, &config).await,
        Commands::Check { document, json } => check_command(&document, json),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => fail(&err),
    }
}

fn fail(err: &dyn std::error::Error) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(1);
}

fn load_config(path: Option<&Path>) -> Result<SyncConfig, CliError> {
    match path {
        Some(path) => Ok(SyncConfig::load(path)?),
        None => Ok(SyncConfig::default()),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn export_command(
    tree: &Path,
    view_type: Option<ViewArg>,
    config: &SyncConfig,
) -> Result<i32, CliError> {
    let tree: OutlineTree = read_json(tree)?;
    let default_view = view_type.map_or(config.default_view_type, ViewType::from);
    let document = tree_to_document(&tree, default_view);
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(0)
}

async fn apply_command(
    tree: &Path,
    document: &Path,
    plan_only: bool,
    json: bool,
    config: &SyncConfig,
) -> Result<i32, CliError> {
    let tree: OutlineTree = read_json(tree)?;
    let document: Document = read_json(document)?;

    if plan_only {
        let expected = expected_blocks(&document, config.boundary_rule);
        let mutations = plan(&expected, &tree.flatten());
        if json {
            println!("{}", serde_json::to_string_pretty(&mutations)?);
        } else if mutations.is_empty() {
            println!("Outline is up to date.");
        } else {
            for mutation in &mutations {
                println!("{}", describe(mutation));
            }
        }
        return Ok(0);
    }

    let host = MemoryHost::with_tree(PAGE_KEY, tree);
    let report = apply_document(&host, PAGE_KEY, &document, config).await?;
    let tree = host.tree(PAGE_KEY)?;

    if json {
        let output = ApplyOutput { report, tree };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_outline(&tree.children, 0);
        println!(
            "updated {}, moved {}, created {}, deleted {}",
            report.updated, report.moved, report.created, report.deleted
        );
    }
    Ok(0)
}

fn check_command(document: &Path, json: bool) -> Result<i32, CliError> {
    let document: Document = read_json(document)?;
    let violations = document.violations();

    if json {
        let output = CheckOutput {
            valid: violations.is_empty(),
            violations: &violations,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if violations.is_empty() {
        println!("Document is valid.");
    } else {
        for violation in &violations {
            println!("{violation}");
        }
    }
    Ok(if violations.is_empty() { 0 } else { 1 })
}

fn describe(mutation: &Mutation) -> String {
    let parent = |parent: &ParentRef| match parent {
        ParentRef::Root => "root".to_string(),
        ParentRef::Entry(index) => format!("block {index}"),
    };
    match mutation {
        Mutation::UpdateText { index, text, .. } => format!("update {index}: {text}"),
        Mutation::Move {
            index,
            parent: to,
            order,
            ..
        } => format!("move {index} under {} at {order}", parent(to)),
        Mutation::Create {
            index,
            parent: to,
            order,
            text,
        } => format!("create {index} under {} at {order}: {text}", parent(to)),
        Mutation::Delete { index, id } => format!("delete {index} ({id})"),
    }
}

fn print_outline(nodes: &[OutlineNode], depth: usize) {
    for node in nodes {
        println!("{}- {}", "  ".repeat(depth), node.text);
        print_outline(&node.children, depth + 1);
    }
}
