use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use crate::output;
use crate::providers::gitlab::GitLabClient;
use crate::registry::{AddOutcome, Registry, RemoveOutcome, SwitchOutcome};
use crate::run::{self, DisplayOptions, RunFilters};

const DEFAULT_URL: &str = "https://gitlab.com";

#[derive(Parser)]
#[command(name = "pipestat")]
#[command(author, version, about = "Displays pipeline status on a CI server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output: list jobs of not-okay pipelines and their links
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check pipeline status
    Run {
        /// Matches against project name including namespace
        #[arg(short, long)]
        projects: Option<String>,

        /// Matches against the branch/ref the pipeline ran on
        #[arg(short, long)]
        references: Option<String>,

        /// Limits projects shown
        #[arg(long, default_value_t = 3)]
        limit_projects: usize,

        /// Limits pipelines shown per project
        #[arg(long, default_value_t = 5)]
        limit_pipelines: usize,

        /// Limits search depth for refs
        #[arg(long, default_value_t = 50)]
        limit_pipelines_search_depth: usize,
    },

    /// Add a server (token is stored as plaintext)
    Add {
        /// Name for the server entry
        alias: String,
        /// URL of the server
        url: String,
        /// Token for authentication
        token: Option<String>,
    },

    /// Switch the active server
    #[command(alias = "s")]
    Switch {
        /// Alias to switch to (as configured)
        alias: String,
    },

    /// List configured servers
    #[command(alias = "ls")]
    List,

    /// Remove a server
    #[command(alias = "rm")]
    Remove {
        /// Alias to be removed from the configuration
        alias: String,
    },
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let mut registry = Registry::load_default()?;

        match &self.command {
            Commands::Run {
                projects,
                references,
                limit_projects,
                limit_pipelines,
                limit_pipelines_search_depth,
            } => {
                let filters = RunFilters {
                    projects: projects.clone(),
                    references: references.clone(),
                    limit_projects: *limit_projects,
                    limit_pipelines: *limit_pipelines,
                    search_depth: *limit_pipelines_search_depth,
                };
                self.execute_run(&registry, &filters).await?;
            }
            Commands::Add { alias, url, token } => {
                Self::execute_add(&mut registry, alias, url, token.as_deref());
            }
            Commands::Switch { alias } => Self::execute_switch(&mut registry, alias),
            Commands::List => Self::print_servers(&registry),
            Commands::Remove { alias } => Self::execute_remove(&mut registry, alias),
        }

        registry.save()?;
        Ok(())
    }

    async fn execute_run(&self, registry: &Registry, filters: &RunFilters) -> Result<()> {
        let active = registry.resolve_active();
        if active.url.is_none() {
            println!("Connects to '{DEFAULT_URL}' by default...");
        }
        let url = active.url.as_deref().unwrap_or(DEFAULT_URL);
        info!("Checking pipeline status on {url}");

        let client = GitLabClient::new(url, active.token.as_deref())?;
        let display = DisplayOptions::from_verbose(self.verbose);
        run::execute(&client, filters, &display).await?;
        Ok(())
    }

    fn execute_add(registry: &mut Registry, alias: &str, url: &str, token: Option<&str>) {
        match registry.add(alias, url, token) {
            AddOutcome::Added => println!("Added config for '{alias}'."),
            AddOutcome::Updated => println!("Updated config for '{alias}'."),
        }
        // add always activates the target, so confirm it like a switch
        println!("Switched to server '{alias}'.");
        Self::print_servers(registry);
    }

    fn execute_switch(registry: &mut Registry, alias: &str) {
        match registry.switch(alias) {
            SwitchOutcome::UnknownAlias => println!("Server '{alias}' is unknown."),
            SwitchOutcome::Switched => {
                println!("Switched to server '{alias}'.");
                Self::print_servers(registry);
            }
        }
    }

    fn execute_remove(registry: &mut Registry, alias: &str) {
        match registry.remove(alias) {
            RemoveOutcome::UnknownAlias => println!("Server '{alias}' is unknown."),
            RemoveOutcome::Removed { promoted, remaining } => {
                if let Some(next) = promoted {
                    println!("Server '{next}' is now active.");
                }
                if remaining {
                    Self::print_servers(registry);
                } else {
                    println!("No servers remaining.");
                }
            }
        }
    }

    fn print_servers(registry: &Registry) {
        for row in output::server_rows(&registry.profiles()) {
            println!("{row}");
        }
    }
}
