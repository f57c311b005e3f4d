//! `provocateur` command-line entry point.
//!
//! Lists the agent registry, previews goal decomposition and routing, and runs
//! goals end to end against in-process echo agents.

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use provocateur_agent::{EchoAgent, LocalDispatcher, TextGenerator};
use provocateur_core::{ProvocateurError, ProvocateurResult};
use provocateur_orchestrator::{GoalRefiner, Orchestrator, ProvocateurConfig, RunOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "provocateur", about = "Agent Provocateur: goal refinement and agent routing")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "provocateur.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the agent registry
    Agents,
    /// Decompose a goal and show the routed tasks
    Plan {
        goal: String,
        /// Replay a saved decomposition response instead of the fallback task
        #[arg(long)]
        plan_file: Option<PathBuf>,
    },
    /// Run a goal against in-process echo agents
    Run {
        goal: String,
        #[arg(long)]
        plan_file: Option<PathBuf>,
        #[arg(long)]
        doc_id: Option<String>,
        #[arg(long)]
        max_results: Option<u64>,
        #[arg(long)]
        search_provider: Option<String>,
        /// Per-task timeout (overrides config)
        #[arg(long)]
        timeout_secs: Option<f64>,
    },
}

/// Serves a decomposition response saved to disk.
struct ReplayGenerator {
    path: PathBuf,
}

#[async_trait]
impl TextGenerator for ReplayGenerator {
    async fn generate(&self, _system_prompt: &str, _prompt: &str) -> ProvocateurResult<String> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ProvocateurError::Generation(format!(
                "Failed to read plan file '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

fn replay(plan_file: Option<PathBuf>) -> Option<Arc<dyn TextGenerator>> {
    plan_file.map(|path| Arc::new(ReplayGenerator { path }) as Arc<dyn TextGenerator>)
}

fn load_config(path: &Path) -> anyhow::Result<ProvocateurConfig> {
    if path.exists() {
        Ok(ProvocateurConfig::from_path(path)?)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(ProvocateurConfig::default())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Agents => {
            let registry = config.registry();
            println!("Registered agents:");
            for profile in registry.iter() {
                println!("  {}: {}", profile.agent_id, profile.description);
                let caps: Vec<&str> = profile.capabilities.iter().map(String::as_str).collect();
                println!("    capabilities: {}", caps.join(", "));
            }
            println!("\nFallback agent: {}", config.orchestrator.fallback_agent);
        }
        Commands::Plan { goal, plan_file } => {
            let mut refiner = GoalRefiner::new(config.registry())
                .with_fallback_agent(config.orchestrator.fallback_agent.clone());
            if let Some(generator) = replay(plan_file) {
                refiner = refiner.with_generator(generator);
            }
            let tasks = refiner.refine_goal(&goal).await?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        Commands::Run {
            goal,
            plan_file,
            doc_id,
            max_results,
            search_provider,
            timeout_secs,
        } => {
            let mut options = RunOptions::new();
            if let Some(doc_id) = doc_id {
                options.insert("doc_id".to_string(), doc_id.into());
            }
            if let Some(max_results) = max_results {
                options.insert("max_results".to_string(), max_results.into());
            }
            if let Some(provider) = search_provider {
                options.insert("search_provider".to_string(), provider.into());
            }
            if let Some(secs) = timeout_secs {
                options.insert("timeout_secs".to_string(), secs.into());
            }

            let mut dispatcher = LocalDispatcher::new(config.orchestrator.fallback_agent.clone());
            for profile in config.registry().iter() {
                dispatcher.register(
                    profile.agent_id.clone(),
                    Arc::new(EchoAgent::new(profile.agent_id.clone())),
                );
            }
            info!(agents = dispatcher.agent_count(), "Echo agents registered");

            let orchestrator =
                Orchestrator::from_config(&config, replay(plan_file), Arc::new(dispatcher));
            let result = orchestrator.process_goal(&goal, &options).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
