use anyhow::Result;
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use semconview_analyzer::{Analyzer, AnalyzerConfig, GoListLoader, PackageLoader, VendorLoader};
use std::path::PathBuf;
use std::sync::Arc;

mod render;

pub use render::{render, render_table, OutputFormat};

const DEFAULT_PATTERN: &str = "**/*.go";

#[derive(Parser)]
#[command(name = "semconview")]
#[command(about = "Semantic-convention dependency viewer for Go projects", long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print version and build target
    #[arg(short = 'v', long, action = ArgAction::SetTrue)]
    version: bool,

    /// Enable informational logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Resolve semconv packages from a vendor-style directory instead of `go list`
    #[arg(long, global = true)]
    vendor_dir: Option<PathBuf>,

    /// Walk files on the calling thread only; errors then follow file order
    #[arg(long, global = true)]
    sequential: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the semantic-convention attributes used by the matched Go files
    List(ListArgs),

    /// Print version and build target
    Version,
}

#[derive(Args)]
struct ListArgs {
    /// Glob patterns selecting the files to analyze
    #[arg(value_name = "PATTERN", default_value = DEFAULT_PATTERN)]
    patterns: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        print!("{}", version_banner());
        return Ok(());
    }
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        std::process::exit(2);
    };

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = if cli.sequential {
        AnalyzerConfig::sequential()
    } else {
        AnalyzerConfig::default()
    };
    let loader: Arc<dyn PackageLoader> = match &cli.vendor_dir {
        Some(dir) => Arc::new(VendorLoader::new(dir.clone())),
        None => Arc::new(GoListLoader::new()),
    };

    match command {
        Commands::List(args) => run_list(args, Analyzer::new(config, loader))?,
        Commands::Version => print!("{}", version_banner()),
    }

    Ok(())
}

fn run_list(args: ListArgs, analyzer: Analyzer) -> Result<()> {
    let dependencies = match analyzer.analyze(&args.patterns).into_result() {
        Ok(dependencies) => dependencies,
        Err(errors) => {
            eprintln!("Error: {errors}");
            std::process::exit(1);
        }
    };
    print!("{}", render(&dependencies, args.output)?);
    Ok(())
}

fn version_banner() -> String {
    format!(
        "{}\nversion: {}\nos: {}\narch: {}\n",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
