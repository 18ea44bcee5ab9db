mod config;
mod error;
mod harvest;
mod hierarchy;
mod project;
mod record;
mod report;
mod store;

#[cfg(test)]
mod fixtures;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::harvest::{harvest, ScriptUsage};
use crate::hierarchy::{dump_scene, scene_roots};
use crate::project::{Failure, Project, REPORT_FILE};
use crate::report::render_csv;
use crate::store::{RecordStore, Roots};

/// scenetree - Dump Unity scene hierarchies and find scripts no scene uses
#[derive(Parser)]
#[command(name = "scenetree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path [default: .scenetree.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump every scene hierarchy and the unused script report
    Dump {
        /// Unity project directory
        project: PathBuf,

        /// Output directory for .dump files and UnusedScripts.csv
        output: PathBuf,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the hierarchy of a single scene
    Tree {
        /// Scene file
        scene: PathBuf,
    },

    /// List scripts that no scene references
    Unused {
        /// Unity project directory
        #[arg(default_value = ".")]
        project: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show record statistics for a scene
    Stats {
        /// Scene file
        scene: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Dump { project, output, json } => {
            cmd_dump(&project, &output, json, config, cli.quiet)
        }
        Commands::Tree { scene } => cmd_tree(&scene, &config),
        Commands::Unused { project, json } => cmd_unused(&project, json, config, cli.quiet),
        Commands::Stats { scene, json } => cmd_stats(&scene, json),
    });

    if let Err(e) = result {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => Config::load(path, true)?,
        None => Config::load(Path::new(DEFAULT_CONFIG_FILE), false)?,
    };
    Ok(config)
}

fn cmd_dump(
    path: &Path,
    output: &Path,
    json: bool,
    config: Config,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let project = Project::open(path, config)?;
    let chatty = !quiet && !json;

    if chatty {
        println!("{} {}", "Dumping scene hierarchies in".cyan().bold(), project.root().display());
    }

    let summary = project.run(output, |scene| {
        tracing::info!(scene = %scene.display(), "processing scene");
        if chatty {
            let name = scene.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
            println!("  {} {}", "Processing scene".dimmed(), name);
        }
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if !quiet {
        print_failures(&summary.failures);

        let elapsed = start.elapsed();
        println!();
        println!("{}", "Run Statistics".green().bold());
        println!("  Scenes found:     {}", summary.scenes_found.to_string().cyan());
        println!("  Scenes dumped:    {}", summary.scenes_dumped.to_string().cyan());
        println!("  Records read:     {}", summary.records_read().to_string().cyan());
        println!("  Lines written:    {}", summary.lines_written().to_string().cyan());
        println!("  Scripts used:    {}", summary.scripts_used.to_string().cyan());
        println!("  Scripts scanned:  {}", summary.scripts_scanned.to_string().cyan());
        println!("  Unused scripts:   {}", summary.unused.len().to_string().yellow());
        println!("  Time elapsed:     {:.2?}", elapsed);
        println!();
        println!(
            "{} {}",
            "Output written to".green(),
            output.display().to_string().cyan()
        );
        println!("  {}", output.join(REPORT_FILE).display().to_string().dimmed());
    }

    Ok(())
}

fn cmd_tree(scene: &Path, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(scene)
        .map_err(|e| format!("{}: {}", scene.display(), e))?;
    let loaded = RecordStore::load(&text)?;
    let dump = dump_scene(&loaded, &config.indent)?;
    if !dump.is_empty() {
        println!("{}", dump);
    }
    Ok(())
}

fn cmd_unused(
    path: &Path,
    json: bool,
    config: Config,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let project = Project::open(path, config)?;
    let (unused, failures) = project.unused_scripts(|scene| {
        tracing::info!(scene = %scene.display(), "harvesting scene");
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&unused)?);
    } else {
        println!("{}", render_csv(&unused));
    }

    if !quiet {
        // stdout carries the report
        for failure in &failures {
            eprintln!("{} {}: {}", "skipped".yellow(), failure.path, failure.error);
        }
    }

    Ok(())
}

#[derive(Serialize, Debug)]
struct SceneStats {
    records: usize,
    stripped: usize,
    kinds: Vec<(String, usize)>,
    roots: usize,
    declared_roots: bool,
    scripts: Vec<String>,
}

fn scene_stats(text: &str) -> Result<SceneStats, Box<dyn std::error::Error>> {
    let scene = RecordStore::load(text)?;

    let mut counts: HashMap<String, usize> = HashMap::new();
    for stored in scene.store.iter() {
        *counts.entry(stored.record.kind().to_string()).or_insert(0) += 1;
    }
    let mut kinds: Vec<(String, usize)> = counts.into_iter().collect();
    kinds.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut usage = ScriptUsage::new();
    harvest(&scene.store, &mut usage);

    Ok(SceneStats {
        records: scene.store.len(),
        stripped: scene.store.iter().filter(|r| r.stripped).count(),
        kinds,
        roots: scene_roots(&scene).iter().filter(|r| !r.is_null()).count(),
        declared_roots: matches!(scene.roots, Roots::Declared(_)),
        scripts: usage.sorted().into_iter().map(String::from).collect(),
    })
}

fn cmd_stats(scene: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(scene)
        .map_err(|e| format!("{}: {}", scene.display(), e))?;
    let stats = scene_stats(&text)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let roots_origin = if stats.declared_roots { "SceneRoots" } else { "parentless transforms" };

    println!("{}", "Scene Statistics".green().bold());
    println!();
    println!("  Records:           {}", stats.records.to_string().cyan());
    println!("  Stripped records:  {}", stats.stripped.to_string().cyan());
    println!("  Root objects:      {} {}", stats.roots.to_string().cyan(), format!("({})", roots_origin).dimmed());
    println!("  Distinct scripts:  {}", stats.scripts.len().to_string().cyan());
    println!();
    println!("{}", "Record Kinds".green().bold());
    println!();

    for (kind, count) in &stats.kinds {
        let bar = "=".repeat((*count / 2).min(40));
        println!("  {:>20} {:>4} {}", kind.cyan(), count, bar.dimmed());
    }

    Ok(())
}

fn print_failures(failures: &[Failure]) {
    if failures.is_empty() {
        return;
    }
    println!();
    println!("{} files skipped", failures.len().to_string().yellow().bold());
    for failure in failures {
        println!("  {} {}: {}", "!".yellow(), failure.path, failure.error.dimmed());
    }
}
