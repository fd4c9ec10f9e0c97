//! lexigraph CLI: Institutional Grammar ontology compiler.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;

use lexigraph::pipeline::{CompileOptions, Compiler, load_records};
use lexigraph::statement::check_observation_constraints;
use lexigraph::store::{JsonOntologyStore, OntologyStore};

#[derive(Parser)]
#[command(name = "lexigraph", version, about = "Institutional Grammar ontology compiler")]
struct Cli {
    /// Optional TOML options file (connector word, collision cap).
    #[arg(long, global = true)]
    options: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile statement records into an ontology JSON file.
    Compile {
        /// Path to the statement records (JSON array of normalized rows).
        #[arg(long)]
        input: PathBuf,

        /// Path the compiled ontology is written to.
        #[arg(long)]
        output: PathBuf,
    },

    /// Check statement records for schema problems without compiling.
    Check {
        /// Path to the statement records.
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let options = match &cli.options {
        Some(path) => CompileOptions::load(path)?,
        None => CompileOptions::default(),
    };

    match cli.command {
        Commands::Compile { input, output } => {
            let records = load_records(&input)?;
            let compiler = Compiler::new(options)?;
            let mut store = JsonOntologyStore::new();
            let summary = compiler.compile(&records, &mut store)?;
            store.save(&output)?;
            println!(
                "Compiled {} statements from {} to {}",
                summary.statements,
                input.display(),
                output.display()
            );
            println!("{summary}");
        }

        Commands::Check { input } => {
            let records = load_records(&input)?;
            check_observation_constraints(&records);
            let observations = records.iter().filter(|r| r.is_observation()).count();
            println!("Read {} statements from {}", records.len(), input.display());
            println!("  observations: {observations}");
            println!("  institutional: {}", records.len() - observations);
        }
    }

    Ok(())
}
