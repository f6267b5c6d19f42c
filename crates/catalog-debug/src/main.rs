use anyhow::{Context, Result};
use catalog_engine::diagnostics::{self, Diagnostic, Severity, count_by_kind};
use catalog_engine::{PartitionCache, PartitionSources, RowIndex, VirtualWindow, visible_rows};
use catalog_runtime::{Config, resolve_config_path};
use catalog_types::{
    CatalogSnapshot, DivisionId, DivisionScope, GroupSelector, ItemId, Row, ViewMode,
};
use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "catalog-debug")]
#[command(about = "Debug tool for catalog partition snapshots", long_about = None)]
struct Cli {
    /// Config file (defaults to the usual resolution order)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the item ids of one group
    Partition {
        #[command(flatten)]
        source: SourceArgs,

        /// Group id, 'unassigned' or 'discontinued'
        #[arg(long)]
        group: GroupSelector,
    },
    /// Print the flattened rows for a selection and division
    Rows {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Print the window range and materialized rows at an offset
    Window {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        scope: ScopeArgs,

        /// Scroll offset in pixels
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Scroll to this item instead of using --offset
        #[arg(long)]
        item: Option<u64>,
    },
    /// Check the snapshot against the partition invariants
    Validate {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// JSON snapshot fixture
    #[arg(long)]
    fixture: PathBuf,

    /// Catalog universe for explicit groups (overrides the config)
    #[arg(long)]
    view: Option<ViewMode>,
}

#[derive(Args)]
struct ScopeArgs {
    /// Only this group (id, 'unassigned' or 'discontinued')
    #[arg(long)]
    group: Option<GroupSelector>,

    /// Division id (main scope when omitted)
    #[arg(long)]
    division: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref())?;
    let config = Config::load_from(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    debug!(path = %config_path.display(), "config loaded");

    match cli.command {
        Command::Partition { source, group } => {
            let loaded = Loaded::open(&source, &config)?;
            let membership = loaded.sources.inputs().membership(group);
            println!("{} {} ({} items)", "Group".bold(), group, membership.len());
            for id in membership.ids() {
                println!("  {}", id);
            }
        }
        Command::Rows { source, scope } => {
            let loaded = Loaded::open(&source, &config)?;
            let rows = loaded.rows(&scope, &config)?;
            for line in render_rows(&rows) {
                println!("{}", line);
            }
        }
        Command::Window {
            source,
            scope,
            offset,
            item,
        } => {
            let loaded = Loaded::open(&source, &config)?;
            let rows = loaded.rows(&scope, &config)?;
            let mut window = VirtualWindow::new(config.window);
            window.set_row_count(rows.len());

            match item {
                Some(raw) => {
                    let index = RowIndex::build(&rows);
                    if !window.scroll_to_id(&index, ItemId::new(raw)) {
                        println!("{}", format!("item {} has no row", raw).yellow());
                    }
                }
                None => {
                    window.on_scroll(offset);
                }
            }

            match window.range() {
                Some(range) => println!(
                    "{} offset={} rows={} range={}..={}",
                    "Window".bold(),
                    window.scroll_offset(),
                    window.row_count(),
                    range.start,
                    range.end
                ),
                None => println!("{} empty", "Window".bold()),
            }
            for line in render_rows(window.slice(&rows)) {
                println!("{}", line);
            }
        }
        Command::Validate { source } => {
            let loaded = Loaded::open(&source, &config)?;
            let findings = diagnostics::validate(
                &loaded.sources.catalog,
                &loaded.sources.groups,
                &loaded.sources.exclusions,
            );
            print_diagnostics(&findings);
            if findings.iter().any(|d| d.severity() == Severity::Error) {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}

struct Loaded {
    snapshot: CatalogSnapshot,
    sources: PartitionSources,
}

impl Loaded {
    fn open(args: &SourceArgs, config: &Config) -> Result<Self> {
        let snapshot = CatalogSnapshot::load(&args.fixture)
            .with_context(|| format!("Failed to load fixture {}", args.fixture.display()))?;
        let sources = PartitionSources::new(
            Arc::new(snapshot.catalog()),
            Arc::new(snapshot.groups_snapshot()),
            Arc::new(snapshot.exclusion_set()),
            args.view.unwrap_or(config.view_mode),
        );
        debug!(
            items = snapshot.items.len(),
            groups = snapshot.groups.len(),
            "fixture loaded"
        );
        Ok(Self { snapshot, sources })
    }

    fn scope(&self, division: Option<u64>) -> Result<DivisionScope> {
        let Some(raw) = division else {
            return Ok(DivisionScope::main());
        };
        let id = DivisionId::new(raw);
        self.snapshot
            .divisions
            .iter()
            .find(|d| d.id == id)
            .map(DivisionScope::from)
            .with_context(|| format!("Division {} not found in fixture", raw))
    }

    fn rows(&self, scope: &ScopeArgs, config: &Config) -> Result<Vec<Row>> {
        let division = self.scope(scope.division)?;
        let mut cache = PartitionCache::default();
        Ok(visible_rows(
            &mut cache,
            &self.sources,
            &division,
            scope.group,
            &config.labels,
        ))
    }
}

fn render_rows(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .map(|row| match row {
            Row::Header {
                group,
                group_label,
                count,
            } => format!("{} {} ({})", group_label.bold(), count, group.dimmed()),
            Row::Item { item_id, .. } => format!("  #{}", item_id),
        })
        .collect()
}

fn print_diagnostics(findings: &[Diagnostic]) {
    if findings.is_empty() {
        println!("Status: {}", "✓ Valid".green().bold());
        return;
    }

    println!("{}", "=== Diagnose Results ===".bold());
    for finding in findings {
        let label = match finding.severity() {
            Severity::Error => "error".red().bold().to_string(),
            Severity::Warning => "warning".yellow().bold().to_string(),
            Severity::Info => "info".cyan().to_string(),
        };
        println!("  {}: {}", label, finding);
    }

    let mut counts: Vec<_> = count_by_kind(findings).into_iter().collect();
    counts.sort();
    println!();
    for (kind, count) in counts {
        println!("  {}: {}", kind, count);
    }
}
