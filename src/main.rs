//! Load test CLI for the books API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "books-load-test")]
#[command(about = "Load testing tool for the books API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a load test from a scenario file
    Run {
        /// Path to scenario YAML file
        #[arg(short, long)]
        scenario: PathBuf,

        /// Override number of simulated users
        #[arg(short, long)]
        users: Option<u32>,

        /// Override test duration in seconds
        #[arg(short, long)]
        duration: Option<u64>,

        /// Output format: table (default), json, csv
        #[arg(short, long, default_value = "table")]
        output: String,
    },

    /// Run a quick smoke test
    Quick {
        /// Base URL of the books API
        #[arg(short = 'b', long, default_value = "http://localhost:8000")]
        url: String,

        /// Number of simulated users
        #[arg(short, long, default_value = "5")]
        users: u32,

        /// Test duration in seconds
        #[arg(short, long, default_value = "30")]
        duration: u64,
    },

    /// List available scenarios
    List {
        /// Scenarios directory
        #[arg(short, long, default_value = "scenarios")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenario,
            users,
            duration,
            output,
        } => {
            println!("Loading scenario: {}", scenario.display());

            // Load and validate configuration
            let mut config = books_load_test::TestConfig::from_file(&scenario)?;

            // Apply overrides
            if let Some(u) = users {
                config.users = u;
            }
            if let Some(d) = duration {
                config.duration_secs = d;
            }

            config.validate()?;

            // Telemetry first: the traced profile instruments every request
            let telemetry = books_load_test::telemetry::init(
                config.profile.traced(),
                config.otlp_endpoint.as_deref(),
            );

            println!("✓ Configuration loaded successfully");
            println!("  Name: {}", config.name);
            println!("  Description: {}", config.description);
            println!("  Duration: {}s", config.duration_secs);
            println!("  Users: {}", config.users);
            println!(
                "  Tracing: {}",
                if telemetry.tracing_enabled() {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            println!();

            // Run the load test
            let runner = books_load_test::LoadRunner::new(config);
            let results = runner.run().await?;

            // Output results
            match output.as_str() {
                "json" => {
                    println!("{}", books_load_test::ResultsReport::format_json(&results)?);
                }
                "csv" => {
                    println!("{}", books_load_test::ResultsReport::csv_header());
                    println!("{}", books_load_test::ResultsReport::format_csv(&results));
                }
                _ => {
                    println!("{}", books_load_test::ResultsReport::format_table(&results));
                }
            }

            Ok(())
        }
        Commands::Quick {
            url,
            users,
            duration,
        } => {
            println!("Running quick test:");
            println!("  URL: {}", url);
            println!("  Users: {}", users);
            println!("  Duration: {}s", duration);
            println!();

            let _telemetry = books_load_test::telemetry::init(false, None);

            // Ad-hoc config with the default weights and wait interval
            let config = books_load_test::TestConfig {
                name: "quick".to_string(),
                description: "Quick smoke test".to_string(),
                base_url: url,
                duration_secs: duration,
                users,
                seed: None,
                weights: books_load_test::ActionWeights::default(),
                wait: books_load_test::WaitInterval::default(),
                profile: books_load_test::Profile::Plain,
                otlp_endpoint: None,
            };

            config.validate()?;

            let runner = books_load_test::LoadRunner::new(config);
            let results = runner.run().await?;

            println!("{}", books_load_test::ResultsReport::format_table(&results));

            Ok(())
        }
        Commands::List { dir } => {
            println!("Available scenarios in {}:", dir.display());
            println!();

            match std::fs::read_dir(&dir) {
                Ok(entries) => {
                    let mut scenarios = Vec::new();

                    for entry in entries.flatten() {
                        let path = entry.path();
                        if path.extension().and_then(|s| s.to_str()) == Some("yaml") {
                            // Try to load the config to get name and description
                            if let Ok(config) = books_load_test::TestConfig::from_file(&path) {
                                scenarios.push((
                                    path.file_name()
                                        .map(|n| n.to_string_lossy().to_string())
                                        .unwrap_or_default(),
                                    config.name,
                                    config.description,
                                ));
                            }
                        }
                    }

                    scenarios.sort_by(|a, b| a.0.cmp(&b.0));

                    if scenarios.is_empty() {
                        println!("No scenario files found");
                    } else {
                        for (filename, name, desc) in scenarios {
                            println!("  {} - {}", filename, name);
                            println!("    {}", desc);
                            println!();
                        }
                    }
                }
                Err(e) => {
                    eprintln!("Error reading directory: {}", e);
                    eprintln!("Make sure the directory exists and is readable");
                }
            }

            Ok(())
        }
    }
}
