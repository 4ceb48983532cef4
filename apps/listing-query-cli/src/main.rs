use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use listing_query_core::{FieldOptions, QueryParams, SortDir, ValueType};
use listing_query_engine::{
    build_aggregation_pipeline, build_sort, compile, fetch_aggregation_page, fetch_cursor_page,
    fetch_facet_page, fetch_offset_page, fetch_scroll_page, MemoryStore, Paginator,
    PipelineOptions, ToDocument,
};
use runtime::{AppConfig, CliArgs};
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};
use std::path::{Path, PathBuf};

/// Listing query tool - compile query strings into store filters and page
/// through JSON documents
#[derive(Parser)]
#[command(name = "listing-query")]
#[command(about = "Listing query tool - compile query strings into store filters and page through JSON documents")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a query string into a filter document, sort, pagination and pipeline
    Compile(QueryArgs),
    /// Run a query string against a JSON array of documents
    Page(PageArgs),
    /// Check configuration
    Check,
}

#[derive(Args)]
struct QueryArgs {
    /// Field rules file (YAML or JSON); defaults to `fields` from the config
    #[arg(short, long)]
    fields: Option<PathBuf>,

    /// Raw query string, e.g. "search=loft&minPrice=100&page=2"
    #[arg(short, long, default_value = "")]
    query: String,

    /// Pipeline extras (`populate`, `computedFields`) as YAML or JSON
    #[arg(long)]
    pipeline: Option<PathBuf>,
}

#[derive(Args)]
struct PageArgs {
    #[command(flatten)]
    query: QueryArgs,

    /// JSON file holding an array of documents
    #[arg(short, long)]
    data: PathBuf,

    /// Extra collection for `$lookup`, as NAME=FILE
    #[arg(long = "collection", value_name = "NAME=FILE")]
    collections: Vec<String>,

    #[arg(short, long, value_enum, default_value_t = Mode::Offset)]
    mode: Mode,

    /// Primary key used by scroll mode and as the default cursor field
    #[arg(long, default_value = "_id")]
    id_field: String,

    /// How the opaque cursor is coerced before comparison
    #[arg(long, value_enum, default_value_t = CursorKind::String)]
    cursor_type: CursorKind,

    /// Base URL for offset-mode navigation links
    #[arg(long, default_value = "/")]
    base_url: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Offset,
    Cursor,
    Scroll,
    Aggregate,
    Facet,
}

#[derive(Clone, Copy, ValueEnum)]
enum CursorKind {
    String,
    Number,
    Date,
}

impl From<CursorKind> for ValueType {
    fn from(kind: CursorKind) -> Self {
        match kind {
            CursorKind::String => ValueType::String,
            CursorKind::Number => ValueType::Number,
            CursorKind::Date => ValueType::Date,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, Path::new(&config.home_dir));
    tracing::debug!(config = ?args.config, "listing-query starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command {
        Some(Commands::Compile(query)) => compile_query(&config, &query),
        Some(Commands::Page(page)) => run_page(&config, &page).await,
        Some(Commands::Check) => check_config(&config),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn read_documents(path: &Path) -> Result<Vec<JsonValue>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} must hold a JSON array of documents", path.display()))
}

/// Rules from `--fields`, else from the config, else none (match-all).
fn load_fields(args: &QueryArgs, config: &AppConfig) -> Result<FieldOptions> {
    let fields = match &args.fields {
        Some(path) => read_yaml::<FieldOptions>(path)?,
        None => config.fields.clone().unwrap_or_default(),
    };
    fields.validate().context("invalid field rules")?;
    Ok(fields)
}

fn load_pipeline_options(args: &QueryArgs) -> Result<PipelineOptions> {
    args.pipeline
        .as_deref()
        .map(read_yaml::<PipelineOptions>)
        .transpose()
        .map(Option::unwrap_or_default)
}

fn print_json(value: &JsonValue) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn compile_query(config: &AppConfig, args: &QueryArgs) -> Result<()> {
    let fields = load_fields(args, config)?;
    let extras = load_pipeline_options(args)?;
    let paginator = Paginator::new(config.pagination);
    let params = QueryParams::parse(&args.query);

    let filter = compile(&params, &fields);
    let sort = build_sort(&params);
    let pagination = paginator.build_pagination(&params);
    let validation = paginator.validate_pagination(&params);
    let pipeline = build_aggregation_pipeline(&params, &fields, &extras, &paginator);
    tracing::debug!(clauses = filter.len(), stages = pipeline.len(), "query compiled");

    print_json(&json!({
        "filter": filter.to_document(),
        "sort": sort.to_document(),
        "pagination": pagination,
        "validation": validation,
        "pipeline": pipeline.to_document(),
    }))
}

fn build_store(args: &PageArgs) -> Result<MemoryStore> {
    let mut store = MemoryStore::new(read_documents(&args.data)?);
    for spec in &args.collections {
        let (name, file) = spec
            .split_once('=')
            .ok_or_else(|| anyhow!("--collection expects NAME=FILE, got '{spec}'"))?;
        store = store.with_collection(name, read_documents(Path::new(file))?);
    }
    Ok(store)
}

async fn run_page(config: &AppConfig, args: &PageArgs) -> Result<()> {
    let fields = load_fields(&args.query, config)?;
    let paginator = Paginator::new(config.pagination);
    let params = QueryParams::parse(&args.query.query);

    // Bad page/limit values are reported rather than silently clamped.
    paginator.validate_pagination(&params).into_result()?;

    let store = build_store(args)?;
    tracing::info!(rows = store.len(), "documents loaded");

    let out = match args.mode {
        Mode::Offset => {
            let page = fetch_offset_page(&store, &params, &fields, &paginator).await?;
            json!({
                "data": page.data,
                "pagination": paginator.build_pagination_metadata(page.pagination, &args.base_url, &params),
            })
        }
        Mode::Cursor => {
            let sort = build_sort(&params);
            let (field, order) = sort
                .keys()
                .first()
                .map(|k| (k.field.clone(), k.dir))
                .unwrap_or_else(|| (args.id_field.clone(), SortDir::Desc));
            let cursor = paginator
                .build_cursor_pagination(&params, &field, order)
                .with_cursor_type(args.cursor_type.into());
            serde_json::to_value(fetch_cursor_page(&store, &params, &fields, &cursor).await?)?
        }
        Mode::Scroll => {
            let scroll = paginator.build_scroll_pagination(&params);
            serde_json::to_value(fetch_scroll_page(&store, &scroll, &args.id_field).await?)?
        }
        Mode::Aggregate => serde_json::to_value(
            fetch_aggregation_page(&store, &params, &fields, &paginator).await?,
        )?,
        Mode::Facet => {
            let extras = load_pipeline_options(&args.query)?;
            serde_json::to_value(
                fetch_facet_page(&store, &params, &fields, &extras, &paginator).await?,
            )?
        }
    };

    tracing::debug!(round_trips = store.round_trips(), "page served");
    print_json(&out)
}

fn check_config(config: &AppConfig) -> Result<()> {
    let rules = config.fields.as_ref().map_or(0, |f| f.rules().len());
    println!("Configuration OK");
    println!("  home_dir: {}", config.home_dir);
    println!(
        "  pagination: default_limit={} max_limit={} default_page={}",
        config.pagination.default_limit, config.pagination.max_limit, config.pagination.default_page
    );
    println!("  field rules: {rules}");
    Ok(())
}
