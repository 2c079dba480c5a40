// Main entrypoint for the ambarictl command-line client.

use ambarictl::app::App;
use ambarictl::config::{Config, ConfigTrait};
use ambarictl::model::DesiredState;
use ambarictl::relocation::RelocationPlan;
use ambarictl::shutdown::Interrupt;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const CONFIG_PATH: &str = "cfg/ambarictl.cfg.yaml";
const CONFIG_PATH_LOCAL: &str = "cfg/ambarictl.cfg.local.yaml";

/// Grace period for a workflow to report where it stopped after Ctrl-C.
const INTERRUPT_GRACE: Duration = Duration::from_secs(30);

/// ambarictl - lifecycle orchestration for Ambari-managed clusters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, value_name = "FILE")]
    cfg: Option<PathBuf>,

    /// Override the pause between two state reads (e.g. "5s")
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    poll_interval: Option<Duration>,

    /// Override the convergence bound of a single transition (e.g. "10m")
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List services and their states
    Services,
    /// List the components of a service and their states
    Components { service: String },
    /// List the hosts whose DataNode the NameNode reports as live
    LiveNodes,
    /// Show the state of a service, a component, or a component on one host
    State {
        name: String,
        #[arg(long)]
        host: Option<String>,
    },
    /// Start a service, or a component on one host
    Start {
        name: String,
        #[arg(long)]
        host: Option<String>,
    },
    /// Stop a service, or a component on one host
    Stop {
        name: String,
        #[arg(long)]
        host: Option<String>,
    },
    /// Request a stop of every service
    StopAll,
    /// Request a start of every service
    StartAll,
    /// Stop every service, wait for all to stop, then start them again
    RestartAll {
        /// Override the pause between confirmed stop and start (e.g. "2m")
        #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
        settle: Option<Duration>,
    },
    /// Move a component from one host to another
    Relocate {
        component: String,
        #[arg(long, value_name = "HOST")]
        from: String,
        #[arg(long, value_name = "HOST")]
        to: String,
    },
}

/// Loads the configuration struct from YAML file.
/// Tries local config first, then falls back to default config.
fn load_cfg(path: Option<PathBuf>) -> Result<Config> {
    if let Some(custom_path) = path {
        return Config::load(&custom_path)
            .with_context(|| format!("failed to load custom config from {:?}", custom_path));
    }

    match Config::load(PathBuf::from(CONFIG_PATH_LOCAL)) {
        Ok(cfg) => Ok(cfg),
        Err(_) => Config::load(PathBuf::from(CONFIG_PATH))
            .with_context(|| format!("failed to load config from {}", CONFIG_PATH)),
    }
}

/// Configures structured logging based on configuration.
fn configure_logger(cfg: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let log_level = cfg
        .logs()
        .and_then(|logs| logs.level.as_ref())
        .map(|s| s.as_str())
        .unwrap_or("info");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if cfg.is_prod() {
        // Production: JSON format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Development: Pretty console format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?
        .block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    let cfg = load_cfg(args.cfg.clone())?;

    // Configure logger (must be done after config is loaded)
    configure_logger(&cfg);
    info!(
        component = "config",
        event = "load_success",
        env = %cfg.ctl.env,
        "config loaded"
    );

    let app = App::new(cfg)?;
    app.refresh_inventory()
        .await
        .context("failed to load cluster inventory")?;

    let interrupt = Interrupt::new(CancellationToken::new(), INTERRUPT_GRACE);
    let result = interrupt.run(execute(&app, &args, interrupt.token())).await?;
    if let Err(e) = &result {
        error!(
            component = "main",
            event = "command_failed",
            error = %e,
            "command failed"
        );
    }
    result
}

async fn execute(app: &App, args: &Args, cancel: CancellationToken) -> Result<()> {
    let mut timeouts = app.timeouts();
    if let Some(poll) = args.poll_interval {
        timeouts.poll_interval = poll;
    }
    if let Some(timeout) = args.timeout {
        timeouts.convergence_timeout = timeout;
    }

    match &args.command {
        Command::Services => {
            for (name, state) in app.services_states().await? {
                println!("{:<24} {}", name, state);
            }
        }
        Command::Components { service } => {
            for (name, state) in app.components_states(service).await? {
                println!("{:<24} {}", name, state);
            }
        }
        Command::LiveNodes => {
            for host in app.live_nodes().await? {
                println!("{}", host);
            }
        }
        Command::State { name, host } => {
            let state = match host {
                Some(host) => app.placement_state(name, host).await?,
                None if app.is_service(name) => app.service_state(name).await?,
                None => app.component_state(name).await?,
            };
            println!("{}", state);
        }
        Command::Start { name, host } => {
            let state = transition(app, name, host.as_deref(), DesiredState::Started, &timeouts, &cancel).await?;
            println!("{}", state);
        }
        Command::Stop { name, host } => {
            let state = transition(app, name, host.as_deref(), DesiredState::Installed, &timeouts, &cancel).await?;
            println!("{}", state);
        }
        Command::StopAll => {
            app.stop_all_services(&timeouts, &cancel).await?;
            println!("stop of all services requested");
        }
        Command::StartAll => {
            app.start_all_services(&timeouts, &cancel).await?;
            println!("start of all services requested");
        }
        Command::RestartAll { settle } => {
            let mut timings = app.restart_timings();
            if let Some(poll) = args.poll_interval {
                timings.poll_interval = poll;
            }
            if let Some(settle) = settle {
                timings.settle_delay = *settle;
            }
            app.restart_all_services(&timings, &cancel).await?;
            println!("all services stopped, start of all services requested");
        }
        Command::Relocate {
            component,
            from,
            to,
        } => {
            let plan = RelocationPlan::new(component.as_str(), from.as_str(), to.as_str());
            let outcome = app.relocate_component(&plan, &timeouts, &cancel).await?;
            println!("{}: {}", plan, outcome);
            if !outcome.is_relocated() {
                anyhow::bail!("relocation of {} did not complete", plan);
            }
        }
    }
    Ok(())
}

async fn transition(
    app: &App,
    name: &str,
    host: Option<&str>,
    desired: DesiredState,
    timeouts: &ambarictl::model::LifecycleTimeouts,
    cancel: &CancellationToken,
) -> Result<ambarictl::model::ObservedState> {
    let state = match host {
        Some(host) => {
            app.transition_component(name, host, desired, timeouts, cancel)
                .await?
        }
        None => app.transition_service(name, desired, timeouts, cancel).await?,
    };
    Ok(state)
}
