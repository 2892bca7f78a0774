use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use bench_analyzer::config::Config;
use bench_analyzer::errors::AnalysisError;
use bench_analyzer::logging;
use bench_analyzer::pipeline;

#[derive(Parser)]
#[command(name = "bench-analyzer", version, about = "Rapid vs ChaseGQR benchmark results analyzer")]
struct Cli {
    /// Analyze this CSV instead of discovering the newest result file
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory searched for result files
    #[arg(long)]
    search_dir: Option<PathBuf>,

    /// Glob pattern for result files (e.g. "final_chase_rewriting_*.csv")
    #[arg(long)]
    pattern: Option<String>,

    /// Directory for the report, charts and derived tables
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl Cli {
    /// CLI flags take precedence over file and environment configuration.
    fn apply(self, config: &mut Config) {
        if let Some(input) = self.input {
            config.input = Some(input);
        }
        if let Some(dir) = self.search_dir {
            config.search_dir = dir;
        }
        if let Some(pattern) = self.pattern {
            config.input_pattern = pattern;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
    }
}

fn main() -> Result<()> {
    // 1. Parse CLI args
    let cli = Cli::parse();

    // 2. Load configuration, then layer CLI overrides on top
    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Config error (using defaults): {}", e);
        Config::default()
    });
    cli.apply(&mut config);

    // 3. Initialize logging before any other output
    logging::init_logging(&config);

    println!("{}", "=".repeat(60));
    println!("  Rapid vs ChaseGQR Analysis Tool");
    println!("{}\n", "=".repeat(60));

    // 4. Run; the two expected operator conditions end the run without artifacts
    let summary = match pipeline::run(&config) {
        Ok(summary) => summary,
        Err(e) if e.is_recoverable() => {
            tracing::warn!(error = %e, "Nothing to analyze");
            if let AnalysisError::InputNotFound { .. } = e {
                println!("\n❌ No CSV files found!");
                println!("Please run the experiment first to produce {}\n", config.input_pattern);
            } else {
                println!("\n❌ No successful test data found!");
            }
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("\n{}", "=".repeat(60));
    println!("  Analysis Complete!");
    println!("{}", "=".repeat(60));
    println!(
        "\nAnalyzed {} successful of {} records from {}",
        summary.successful_records,
        summary.total_records,
        summary.input.display()
    );
    println!("\nGenerated files:");
    for path in &summary.artifacts {
        println!("  {}", path.display());
    }
    println!();

    Ok(())
}
