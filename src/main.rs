//! CLI entry point for the text clustering system.
//!
//! Reads one text per line from a file or stdin, clusters them, and prints
//! the result as JSON. Validation errors exit with code 1, computation
//! errors with code 2, so wrappers can tell a bad request from a failure.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use textclust::{
    ClusteringPipeline, FastEmbedEncoder, KMeansParams, Settings, parse_embedding_model,
};
use tracing_subscriber::EnvFilter;

/// Semantic text clustering
#[derive(Parser)]
#[command(
    name = "textclust",
    version = env!("CARGO_PKG_VERSION"),
    about = "Semantic text clustering",
    long_about = "Group texts into semantic clusters, pick a representative per cluster,\nand optionally attach a 2-D projection for plotting."
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster texts read from a file or stdin (one text per line)
    Cluster {
        /// Number of clusters to produce (2-50)
        #[arg(short = 'k', long = "clusters", default_value_t = 3)]
        clusters: usize,

        /// Input file; reads stdin when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Attach a 2-D projection of points and centroids
        #[arg(long)]
        visualize: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Display active settings
    Config,

    /// Create a default settings file at .textclust/settings.toml
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        Settings::load_from(config_path).unwrap_or_else(|e| {
            eprintln!(
                "Configuration error loading from {}: {}",
                config_path.display(),
                e
            );
            std::process::exit(1);
        })
    } else {
        Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        })
    };

    match cli.command {
        Commands::Init { force } => {
            let config_path = PathBuf::from(".textclust/settings.toml");

            if config_path.exists() && !force {
                eprintln!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                eprintln!("Use --force to overwrite");
                std::process::exit(1);
            }

            match Settings::default().save(&config_path) {
                Ok(()) => {
                    println!("Created configuration file at: {}", config_path.display());
                    println!("Edit this file to customize your settings.");
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Config => match toml::to_string_pretty(&config) {
            Ok(toml_str) => println!("{toml_str}"),
            Err(e) => {
                eprintln!("Error displaying config: {e}");
                std::process::exit(1);
            }
        },

        Commands::Cluster {
            clusters,
            file,
            visualize,
            pretty,
        } => {
            let texts = read_texts(file.as_deref()).unwrap_or_else(|e| {
                eprintln!("Error reading input: {e}");
                std::process::exit(1);
            });

            let model = parse_embedding_model(&config.embedding.model).unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(2);
            });
            let encoder = FastEmbedEncoder::with_model(model).unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(2);
            });

            let pipeline = ClusteringPipeline::with_params(
                Arc::new(encoder),
                KMeansParams::from(&config.clustering),
            );

            match pipeline.run(&texts, clusters, visualize) {
                Ok(result) => {
                    let json = if pretty {
                        serde_json::to_string_pretty(&result)
                    } else {
                        serde_json::to_string(&result)
                    };
                    match json {
                        Ok(rendered) => println!("{rendered}"),
                        Err(e) => {
                            eprintln!("Error serializing result: {e}");
                            std::process::exit(2);
                        }
                    }
                }
                Err(e) => {
                    eprintln!("Error [{}]: {e}", e.status_code());
                    std::process::exit(if e.is_validation() { 1 } else { 2 });
                }
            }
        }
    }
}

/// Read texts from a file or stdin, one per line, skipping blank lines.
fn read_texts(file: Option<&Path>) -> std::io::Result<Vec<String>> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => std::io::read_to_string(std::io::stdin())?,
    };

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
