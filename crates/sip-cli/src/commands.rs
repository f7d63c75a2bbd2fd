use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use sip_pack::{Collaborators, ExportItem, ExportJob, ExportOptions};
use sip_rules::{Rule, RuleEngine, RuleFilter, RuleReport};
use sip_tree::{FileTree, PathRegistry};
use sip_types::{ConfigProvider, MapConfig, TomlConfig};
use sip_walk::filter::{split_patterns, IGNORE_PATTERNS_KEY};
use sip_walk::{IgnoreFilter, TreeBuilder, TreeWalker, WalkStats};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Scan(args) => cmd_scan(args, cli.json),
        Command::Plan(args) => cmd_plan(args, cli.json),
        Command::Export(args) => cmd_export(args, cli.json),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Arc<dyn ConfigProvider>> {
    match path {
        Some(path) => {
            let config = TomlConfig::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?;
            Ok(Arc::new(config))
        }
        None => Ok(Arc::new(MapConfig::new())),
    }
}

/// Ignore patterns from the configuration plus any given on the command
/// line.
fn build_filter(
    cli_patterns: &[String],
    config: &dyn ConfigProvider,
) -> anyhow::Result<IgnoreFilter> {
    let mut patterns: Vec<String> = config
        .get(IGNORE_PATTERNS_KEY)
        .map(|raw| split_patterns(&raw))
        .unwrap_or_default();
    patterns.extend(cli_patterns.iter().cloned());
    Ok(IgnoreFilter::new(&patterns)?)
}

/// Run a full walk of `roots`, returning the built tree, the registry with
/// ignore records, and the walk stats.
fn scan_tree(
    roots: &[PathBuf],
    filter: IgnoreFilter,
) -> anyhow::Result<(FileTree, Arc<PathRegistry>, WalkStats)> {
    let registry = Arc::new(PathRegistry::new());
    let builder = TreeBuilder::new();
    let tree_handle = builder.tree();

    let walker = TreeWalker::new(filter, Arc::clone(&registry));
    let stats = walker.walk(roots.to_vec(), builder).join()?;

    let tree = tree_handle.lock().expect("tree lock poisoned").clone();
    Ok((tree, registry, stats))
}

/// Scan plus one rule application: the shared front half of `plan` and
/// `export`.
fn run_plan(
    args: &PlanArgs,
) -> anyhow::Result<(RuleReport, WalkStats, Arc<dyn ConfigProvider>)> {
    let config = load_config(args.config.as_ref())?;
    let filter = build_filter(&args.ignore, config.as_ref())?;
    let (tree, registry, stats) = scan_tree(&args.roots, filter)?;

    let mut rule = Rule::new(args.association.into(), args.roots.clone())
        .with_filter(RuleFilter::new(&args.include, &args.exclude)?);
    if let Some(key) = &args.metadata {
        rule = rule.with_metadata_template(key.clone());
    }

    let mut engine = RuleEngine::new(registry, Arc::clone(&config));
    let report = engine.apply(rule, &tree)?;
    Ok((report, stats, config))
}

fn cmd_scan(args: ScanArgs, json: bool) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;
    let filter = build_filter(&args.ignore, config.as_ref())?;
    let (tree, registry, stats) = scan_tree(&args.roots, filter)?;
    let counts = registry.snapshot_counts();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "files": stats.visited_files,
                "directories": stats.visited_dirs,
                "ignored": stats.ignored,
                "failed": stats.failed,
                "cancelled": stats.cancelled,
                "tree_nodes": tree.len(),
                "registry": { "ignored": counts.ignored, "mapped": counts.mapped },
            })
        );
        return Ok(());
    }

    println!("{} Scan finished", "✓".green().bold());
    println!("  Files:       {}", stats.visited_files.to_string().bold());
    println!("  Directories: {}", stats.visited_dirs.to_string().bold());
    println!("  Ignored:     {}", stats.ignored.to_string().yellow());
    if stats.failed > 0 {
        println!("  Failed:      {}", stats.failed.to_string().red());
    }
    Ok(())
}

fn cmd_plan(args: PlanArgs, json: bool) -> anyhow::Result<()> {
    let (report, stats, _config) = run_plan(&args)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} Planned {} package(s) from {} file(s)",
        "✓".green().bold(),
        report.assemblies.len().to_string().bold(),
        stats.visited_files,
    );
    for assembly in &report.assemblies {
        println!(
            "  {} {} ({}, {} files)",
            "package:".cyan(),
            assembly.title.bold(),
            assembly.level,
            assembly.file_count(),
        );
    }
    if report.filtered > 0 {
        println!("  {} {} file(s) filtered out", "note:".yellow(), report.filtered);
    }
    for skip in &report.skipped {
        println!(
            "  {} {} already mapped by rule {}",
            "skipped:".yellow(),
            skip.path.display(),
            skip.owner.short_id(),
        );
    }
    Ok(())
}

fn cmd_export(args: ExportArgs, json: bool) -> anyhow::Result<()> {
    let (report, _stats, config) = run_plan(&args.plan)?;
    if report.assemblies.is_empty() {
        anyhow::bail!("nothing to export: no files were mapped");
    }

    let batch: Vec<ExportItem> = report
        .assemblies
        .into_iter()
        .map(ExportItem::new)
        .collect();
    let total = batch.len();

    let job = ExportJob::start(
        &args.output,
        batch,
        ExportOptions {
            format: args.format.into(),
            create_report: args.report,
        },
        Collaborators {
            config,
            ..Collaborators::default()
        },
    )?;

    while !job.is_finished() {
        if !json {
            let eta = job.eta_millis();
            let eta_label = if eta < 0.0 {
                "eta ?".to_string()
            } else {
                format!("eta {:.0}s", eta / 1000.0)
            };
            eprint!(
                "\r{:>3.0}% [{}/{}] {} {} ({})        ",
                job.progress() * 100.0,
                job.created_count() + job.error_count(),
                total,
                job.current_action(),
                job.current_item(),
                eta_label,
            );
        }
        thread::sleep(Duration::from_millis(100));
    }
    if !json {
        eprintln!();
    }

    let summary = job.join()?;
    if json {
        println!(
            "{}",
            serde_json::json!({
                "created": summary.created,
                "errors": summary.errors,
                "cancelled": summary.cancelled,
                "produced": summary.produced,
                "report": summary.report_path,
            })
        );
        return Ok(());
    }

    println!(
        "{} Exported {} package(s), {} error(s)",
        if summary.errors == 0 { "✓".green().bold() } else { "!".yellow().bold() },
        summary.created.to_string().bold(),
        summary.errors,
    );
    for path in &summary.produced {
        println!("  {} {}", "wrote:".cyan(), path.display());
    }
    if let Some(report_path) = &summary.report_path {
        println!("  {} {}", "report:".cyan(), report_path.display());
    }
    Ok(())
}
