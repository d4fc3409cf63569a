mod cli;
mod logging;
mod prompt;
mod reporter;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use dotenv::dotenv;
use indicatif::HumanBytes;
use tracing::{debug, error, info, warn};

use cli::{Cli, Commands, PageArgs, RunArgs, SourceArgs};
use pan_renumber::config::{self as app_config, AppConfig};
use pan_renumber::host::{seed_roots, HostPage, SnapshotPage};
use pan_renumber::naming::{build_plan, preview, PreviewRow};
use pan_renumber::orchestrator::{BatchOptions, DestinationSource, RenameMoveOrchestrator};
use pan_renumber::scanner::{AbortOnFailure, FailurePolicy, ScanOptions, ScanReport, TreeScanner};
use pan_renumber::{DirectoryResolver, PanClient, RenamePlanEntry};
use prompt::{prompt_confirm, AskForDestination, AskOnFailure};
use reporter::CliReporter;

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("Error starting runtime: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(args)) {
        error!("Error: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> Result<()> {
    let config = app_config::load_configuration().context("Error loading configuration")?;

    match args.command {
        Some(Commands::Scan(source)) => {
            let report = scan(&config, &source).await?;
            print_scan(&report);
        }
        Some(Commands::Plan(source)) => {
            let report = scan(&config, &source).await?;
            let plan = build_plan(&report.files);
            print_plan(&plan);
        }
        Some(Commands::Run(run_args)) => run_batch(&config, &run_args).await?,
        Some(Commands::Resolve(page_args)) => resolve(&config, &page_args)?,
        Some(Commands::PrintConfig) => print_config(&config)?,
        None => {
            let _ = Cli::command().print_long_help();
        }
    }
    Ok(())
}

/// Where roots come from plus the page, when there is one.
struct Source {
    page: Option<SnapshotPage>,
    report: ScanReport,
}

async fn scan_source(config: &AppConfig, args: &SourceArgs) -> Result<Source> {
    let client = PanClient::new(config)?;
    let reporter = CliReporter::new();
    let scanner = TreeScanner::new(&client, ScanOptions::from(&config.scan), &reporter);

    let (page, roots) = match (&args.page, &args.dir) {
        (Some(path), _) => {
            let page = SnapshotPage::load(path)
                .with_context(|| format!("Error reading page capture {}", path.display()))?;
            let roots = seed_roots(&page);
            (Some(page), roots)
        }
        (None, Some(dir)) => (None, scanner.roots_from_directory(dir).await?),
        (None, None) => bail!("Either --page or --dir is required"),
    };
    if roots.is_empty() {
        bail!("Nothing to scan: the source has no entries");
    }
    debug!("Seeded {} roots", roots.len());

    let policy: &dyn FailurePolicy = if args.abort_on_error {
        &AbortOnFailure
    } else {
        &AskOnFailure
    };
    let report = scanner.scan(&roots, policy).await?;
    Ok(Source { page, report })
}

async fn scan(config: &AppConfig, args: &SourceArgs) -> Result<ScanReport> {
    Ok(scan_source(config, args).await?.report)
}

async fn run_batch(config: &AppConfig, args: &RunArgs) -> Result<()> {
    let Source { page, report } = scan_source(config, &args.source).await?;
    if report.files.is_empty() {
        println!("{}", "No media files found.".yellow());
        return Ok(());
    }

    let plan = build_plan(&report.files);
    print_plan(&plan);

    if !args.yes && !console::user_attended() {
        bail!("No terminal to confirm on; pass --yes to run unattended");
    }
    if !args.yes && !prompt_confirm(&format!("Rename {} files?", plan.len()), Some(false))? {
        info!("Cancelled by operator");
        return Ok(());
    }

    let mut resolver = DirectoryResolver::new(&config.resolver);
    if let Some(page) = &page {
        observe_page(&mut resolver, page);
    }

    let destination = if args.rename_only {
        DestinationSource::None
    } else if let Some(dest) = &args.dest {
        DestinationSource::manual(dest)
    } else if let Some(page) = &page {
        DestinationSource::Resolve {
            resolver: &mut resolver,
            host: page,
            policy: &AskForDestination,
        }
    } else if let Some(dir) = &args.source.dir {
        // Without a page the listed directory is the current one.
        DestinationSource::Fixed(dir.clone())
    } else {
        DestinationSource::None
    };

    let client = PanClient::new(config)?;
    let reporter = CliReporter::new();
    let orchestrator =
        RenameMoveOrchestrator::new(&client, BatchOptions::from(&config.batch), &reporter);
    let outcome = orchestrator.run(&plan, destination).await?;
    debug!(
        "Batch started {} and took {:?}",
        outcome.started_at.to_rfc3339(),
        outcome.duration
    );

    for failure in &outcome.rename_failures {
        println!(
            "  {} {} -> {}: {}",
            "✗".red(),
            failure.original_name,
            failure.new_name,
            failure.error
        );
    }
    if let Some(err) = &outcome.move_error {
        println!(
            "{} Move failed ({}); the files keep their new names where they are.",
            "!".yellow(),
            err
        );
    }

    if outcome.is_complete_success() {
        println!("{}", "All done.".green());
    } else {
        warn!(
            "Batch finished with failures: {} renames and {} moves failed",
            outcome.stats.rename_fail, outcome.stats.move_fail
        );
    }
    Ok(())
}

fn observe_page(resolver: &mut DirectoryResolver, page: &SnapshotPage) {
    resolver.navigate(&page.navigation());
    for request in page.requests() {
        resolver.observe_request(request);
    }
}

fn resolve(config: &AppConfig, args: &PageArgs) -> Result<()> {
    let page = SnapshotPage::load(&args.page)
        .with_context(|| format!("Error reading page capture {}", args.page.display()))?;
    let mut resolver = DirectoryResolver::new(&config.resolver);
    observe_page(&mut resolver, &page);

    match resolver.resolve_on(&page) {
        Some(resolution) => println!(
            "{} {}",
            resolution.id.green(),
            format!("(via {})", resolution.source).dimmed()
        ),
        None => println!("{}", "Directory id could not be resolved".yellow()),
    }
    Ok(())
}

fn print_scan(report: &ScanReport) {
    for file in &report.files {
        println!("{:>10}  {}", HumanBytes(file.size).to_string(), file.path);
    }
    for skipped in &report.skipped {
        println!("{} {} ({})", "skipped".yellow(), skipped.path, skipped.error);
    }
    println!("{}", report.summary());
}

fn print_plan(plan: &[RenamePlanEntry]) {
    println!("{}", console::style(format!("{} files will be renamed:", plan.len())).bold());
    for row in preview(plan) {
        match row {
            PreviewRow::Entry { ordinal, entry } => {
                println!("{:>5}. {} -> {}", ordinal, entry.original_name, entry.new_name.green())
            }
            PreviewRow::Elided(hidden) => println!("{:>5}  ... {} more ...", "", hidden),
        }
    }
}

fn print_config(config: &AppConfig) -> Result<()> {
    let mut shown = config.clone();
    if !shown.cookie.is_empty() {
        shown.cookie = "<redacted>".to_string();
    }
    let text = toml::to_string_pretty(&shown).context("Error formatting configuration")?;
    println!("{}", text);
    Ok(())
}
