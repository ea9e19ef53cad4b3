use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kiln::config::Config;
use kiln::graph::{provider_index::ProviderIndex, GraphBuilder};
use kiln::plugin::{ExtensionHooks, NoopHooks};
use kiln::scheduler::{self, Mode};
use kiln::{order, probe, resolver};

/// Thin wrapper around the resolver/orderer/scheduler library. Argument
/// parsing and output formatting here are not load-bearing; the graph
/// logic lives in the library.
#[derive(Parser)]
#[command(name = "kiln", about = "declarative dependency-graph build orchestrator")]
struct Cli {
    /// Target names to build (empty = default targets)
    targets: Vec<String>,

    /// Declaration file path
    #[arg(short = 'b', long = "build", default_value = "kiln.toml")]
    build: PathBuf,

    /// Configuration file path
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Invoke clean actions instead of build actions
    #[arg(long)]
    clean: bool,

    /// Resolve and order but do not invoke action callbacks
    #[arg(short = 'n', long = "dry-run")]
    dry_run: bool,

    /// Enumerate registered targets and exit
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// Serialize the declaration graph back out and exit
    #[arg(short = 'j', long = "json-output")]
    json_output: bool,

    /// Verbose resolver tracing
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    let mut builder = GraphBuilder::new();
    if cli.build.exists() {
        let text = std::fs::read_to_string(&cli.build)
            .with_context(|| format!("failed to read {}", cli.build.display()))?;
        builder.load_declarations(&text).context("failed to parse declarations")?;
    }

    if cli.json_output {
        let decls = builder.to_decls();
        println!("{}", serde_json::to_string_pretty(&decls)?);
        return Ok(());
    }

    let decls_for_list = builder.to_decls();
    let builder_for_hooks = builder.clone();
    let mut hooks = NoopHooks;
    let mut graph = builder.build(&mut hooks).context("failed to validate declaration graph")?;

    if cli.list {
        print_list(&decls_for_list);
        return Ok(());
    }

    probe::probe_all(&mut graph, &config);

    for requested in &cli.targets {
        if !hooks.choose_essential(&builder_for_hooks, requested) {
            return Err(kiln::Error::PluginReject(requested.clone()).into());
        }
    }

    let index = ProviderIndex::build(&graph);
    let outcome = resolver::resolve(&graph, &index, &cli.targets)?;
    let mut sequence = order::order(&graph, &outcome.queue_set, &outcome.full_provides);

    sequence = hooks.build_queue(&builder_for_hooks, sequence)?;
    sequence = hooks.enqueue_targets(&builder_for_hooks, sequence)?;

    let mode = if cli.clean { Mode::Clean } else { Mode::Build };
    let report = scheduler::run(&mut graph, &sequence, mode, cli.dry_run);

    for result in &report.results {
        let verb = if result.ran { "ran" } else { "skip" };
        println!("{:5} {:<20} {}", verb, result.name, result.message);
    }

    if !report.success {
        let failed = report
            .results
            .iter()
            .rev()
            .find(|r| r.ran && !r.success)
            .expect("a failing report always has a failing result");
        return Err(kiln::Error::ActionFailure {
            target: failed.name.clone(),
            message: failed.message.clone(),
        }
        .into());
    }
    Ok(())
}

fn print_list(decls: &kiln::graph::DeclMap) {
    let mut names: Vec<&String> = decls.keys().collect();
    names.sort();
    let mut default_names = Vec::new();

    for name in &names {
        let decl = &decls[*name];
        let is_abstract = decl.exists.is_none() && decl.actions.is_none() && decl.layers.is_none();
        let mut annotations = Vec::new();
        if decl.essential {
            annotations.push("essential");
        }
        if is_abstract {
            annotations.push("abstract");
        }
        let suffix = if annotations.is_empty() {
            String::new()
        } else {
            format!(" ({})", annotations.join(", "))
        };
        println!("{}{}", name, suffix);
        if !decl.depends.is_empty() {
            println!("  depends: {}", decl.depends.join(", "));
        }
        if !decl.provides.is_empty() {
            println!("  provides: {}", decl.provides.join(", "));
        }
        if let Some(artifact) = &decl.exists {
            println!("  output: {}", artifact);
        }
        if *name == "default" {
            default_names.extend(decl.depends.iter().cloned());
        }
    }

    if !default_names.is_empty() {
        println!("Default targets: {}", default_names.join(", "));
    }
}
