use anyhow::Context;
use bomtastic_core::{analyze, AnalyzeOptions, Bom, SubgraphCounting};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// bomtastic - SBOM summaries for npm projects
#[derive(Parser, Debug)]
#[command(name = "bomtastic")]
#[command(version)] // Auto-pull version from Cargo.toml
#[command(about = "Summarize a package-lock.json as a software bill of materials", long_about = None)]
struct Cli {
    /// Lockfile to analyze [default: package-lock.json]
    lockfile: Option<PathBuf>,

    /// Where to write the BOM [default: bom.json]
    output: Option<PathBuf>,

    /// Leave dev dependencies out of the graph
    #[arg(long)]
    ignore_dev: bool,

    /// Do not write the BOM to disk
    #[arg(long)]
    no_save: bool,

    /// Do not embed the full dependency graph in the BOM
    #[arg(long)]
    no_graph: bool,

    /// Count distinct reachable packages instead of summing child subgraphs
    #[arg(long)]
    distinct: bool,

    /// Print the BOM as JSON on stdout
    #[arg(long)]
    stdout: bool,

    /// Show progress detail on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> AnalyzeOptions {
        AnalyzeOptions {
            package_lock_file_path: self.lockfile.clone(),
            output_file_path: self.output.clone(),
            save_to_file: !self.no_save,
            ignore_dev: self.ignore_dev,
            include_graph: !self.no_graph,
            subgraph_counting: if self.distinct {
                SubgraphCounting::Distinct
            } else {
                SubgraphCounting::SumWithReuse
            },
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("BOMTASTIC_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "bomtastic=debug,bomtastic_core=debug,warn"
        } else {
            "warn"
        })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn print_summary(bom: &Bom) {
    println!("{} v{}", bom.name, bom.version);
    println!("  top-level dependencies: {}", bom.top_level_dependencies);
    println!("  total dependencies:     {}", bom.total_dependencies);
    if bom.dependencies_with_multiple_versions.is_empty() {
        println!("  no packages with multiple versions");
    } else {
        println!(
            "  multiple versions:      {}",
            bom.dependencies_with_multiple_versions.join(", ")
        );
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = cli.options();
    tracing::debug!(?options, "starting analysis");
    let bom = analyze(&options).context("failed to analyze lockfile")?;

    if cli.stdout {
        println!("{}", serde_json::to_string_pretty(&bom)?);
    } else {
        print_summary(&bom);
    }

    Ok(())
}
