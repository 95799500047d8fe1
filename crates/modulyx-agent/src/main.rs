//! Modulyx: functional modules of a protein interaction network.
//! Entry point for the query binary.
//!
//! Usage: modulyx [--interactions network.json] GENE [GENE ...]
//! Genes may also be given comma-separated in MODULYX_GENES.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use modulyx_agent::{config, ModuleAnalysis};
use modulyx_common::config::PipelineConfig;
use modulyx_string::{InteractionSource, StaticInteractionSource, StringClient};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "modulyx", about = "Functional modules of a protein interaction network")]
#[command(version)]
struct Args {
    /// Saved STRING `json/network` response; skips the upstream service
    #[arg(long)]
    interactions: Option<PathBuf>,

    /// Query gene names
    #[arg(env = "MODULYX_GENES", value_delimiter = ',', required = true)]
    genes: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("modulyx=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Modulyx {}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match config::load() {
        Ok(c) => {
            info!(
                "Configuration loaded. Species {}, confidence {}, inflation {}",
                c.string.species, c.network.confidence, c.clustering.inflation
            );
            c
        }
        Err(e) => {
            warn!("Could not load {}: {e}", config::config_path());
            warn!("Continuing with default settings.");
            PipelineConfig::default()
        }
    };

    let source: Arc<dyn InteractionSource> = match &args.interactions {
        Some(path) => {
            info!("Offline mode: reading interactions from {}", path.display());
            Arc::new(StaticInteractionSource::from_json_file(path)?)
        }
        None => Arc::new(StringClient::new(&config.string)?),
    };

    let analysis = ModuleAnalysis::new(config, source, &args.genes).await?;
    let report = analysis.run_query().await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genes_positional_and_comma_separated() {
        let args = Args::try_parse_from(["modulyx", "Act5C,Mhc", "up"]).unwrap();
        assert_eq!(args.genes, vec!["Act5C", "Mhc", "up"]);
        assert!(args.interactions.is_none());
    }

    #[test]
    fn test_interactions_flag_takes_path() {
        let args = Args::try_parse_from(["modulyx", "--interactions", "net.json", "Act5C"]).unwrap();
        assert_eq!(args.interactions, Some(PathBuf::from("net.json")));
        assert!(Args::try_parse_from(["modulyx", "Act5C", "--interactions"]).is_err());
    }
}
