//! Command-line interface definition

use clap::Parser;
use stampede_config::StampedeConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "stampede",
    about = "Concurrent virtual-user load runs against an Odoo-style web client",
    version
)]
pub struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Target host URL, overrides the configuration
    #[arg(long)]
    pub host: Option<String>,

    /// Number of concurrent virtual users
    #[arg(short, long)]
    pub users: Option<usize>,

    /// Flow iterations per virtual user; unlimited when omitted
    #[arg(short, long)]
    pub iterations: Option<u64>,

    /// Flow to run, repeatable; overrides the configured flow list
    #[arg(long = "flow")]
    pub flows: Vec<String>,

    /// Seed for reproducible request ids and flow randomness
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration
    pub fn apply(&self, config: &mut StampedeConfig) {
        if let Some(host) = &self.host {
            config.target.host = host.clone();
        }
        if let Some(users) = self.users {
            config.load.users = users;
        }
        if let Some(iterations) = self.iterations {
            config.load.iterations = Some(iterations);
        }
        if !self.flows.is_empty() {
            config.load.flows = self.flows.clone();
        }
    }
}
