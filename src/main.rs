/*!
 * rmbridge CLI - legacy job client operations against a resource manager
 */

use clap::{Args, Parser, Subcommand, ValueEnum};
use rmbridge::{
    cli_style::{
        job_counts, jobs_table, metrics_table, print_error, print_info, print_success,
        print_warning, queues_table, section_header, stats_table, trackers_table,
    },
    config::{BridgeConfig, LogLevel},
    convert,
    error::{BridgeError, Result, EXIT_SUCCESS},
    logging, JobId, ResourceDelegate,
};
use rmbridge_interface::{ApplicationId, ApplicationMaster, ApplicationSubmissionContext};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "rmbridge")]
#[command(version, about = "Run legacy job client operations against a cluster resource manager", long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/rmbridge/config.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Resource manager address (host:port), overrides the config file
    #[arg(long, env = "RMBRIDGE_RM_ADDRESS", global = true)]
    rm_address: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Path to log file (default: stderr)
    #[arg(long, value_name = "FILE", global = true)]
    log: Option<PathBuf>,

    /// Enable verbose logging (equivalent to --log-level=debug)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate a new job id
    NewJobId,

    /// Submit an application and wait for its coordinator to start
    Submit {
        /// JSON file holding the submission context (without an id)
        #[arg(long, value_name = "FILE")]
        context: PathBuf,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Wait for the coordinator of a submitted application
    Wait {
        /// application_<ts>_<seq> or job_<ts>_<seq>
        #[arg(value_parser = parse_application_id)]
        application_id: ApplicationId,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// List every job known to the resource manager
    Jobs,

    /// List active task trackers (cluster nodes)
    Trackers,

    /// Show slot-based cluster metrics
    Metrics,

    /// List queues, flattened
    Queues {
        /// Only the direct children of the root queue
        #[arg(long, conflicts_with = "children")]
        root: bool,

        /// Only the direct children of the given queue
        #[arg(long, value_name = "QUEUE")]
        children: Option<String>,
    },

    /// Show one queue and its jobs
    Queue { name: String },

    /// Print the staging area directory
    StagingDir,

    /// Print the system directory
    SystemDir {
        /// Delete the directory and its contents first
        #[arg(long)]
        clean: bool,
    },

    /// Write a config file with default values
    ConfigInit {
        /// Destination (default: ~/.config/rmbridge/config.toml)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
struct WaitArgs {
    /// Give up waiting after this many seconds
    #[arg(long)]
    deadline_secs: Option<u64>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

fn parse_application_id(value: &str) -> std::result::Result<ApplicationId, String> {
    if let Ok(job_id) = value.parse::<JobId>() {
        return Ok(convert::application_id(&job_id));
    }
    value.parse::<ApplicationId>().map_err(|e| e.to_string())
}

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            print_error(&e.to_string(), suggestion(&e));
            e.exit_code()
        }
    };
    std::process::exit(code);
}

/// Hint printed under the error message
fn suggestion(err: &BridgeError) -> Option<&'static str> {
    match err {
        BridgeError::Configuration(_) => {
            Some("Check the config file, or run 'rmbridge config-init' to write one")
        }
        BridgeError::Transport(_) => {
            Some("Check that the resource manager is reachable (--rm-address)")
        }
        BridgeError::DeadlineExceeded { .. } => {
            Some("Raise --deadline-secs, or run 'rmbridge wait' again later")
        }
        BridgeError::QueueNotFound(_) => Some("Run 'rmbridge queues' to list known queues"),
        _ => None,
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Commands that never reach the resource manager
    match &cli.command {
        Commands::ConfigInit { path, force } => return write_default_config(path.as_deref(), *force),
        Commands::Completions { shell } => {
            use clap::CommandFactory;
            use clap_complete::generate;
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "rmbridge", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let mut config = load_config(cli.config.as_deref())?;

    // Override config with CLI arguments
    if let Some(address) = cli.rm_address.clone() {
        config.resource_manager.address = address;
    }
    if let Some(level) = cli.log_level {
        config.logging.log_level = level.into();
    }
    if cli.log.is_some() {
        config.logging.log_file = cli.log.clone();
    }
    config.logging.verbose |= cli.verbose;
    config.validate()?;

    if let Err(e) = logging::init_logging(&config.logging) {
        print_warning(&format!("Failed to initialize logging: {}", e));
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(handle_command(cli.command, &config, cli.json))
}

/// Explicit `--config` must load; the default location is optional
fn load_config(explicit: Option<&Path>) -> Result<BridgeConfig> {
    if let Some(path) = explicit {
        return BridgeConfig::from_file(path);
    }
    match BridgeConfig::default_path() {
        Some(path) if path.exists() => BridgeConfig::from_file(&path),
        _ => Ok(BridgeConfig::default()),
    }
}

fn write_default_config(path: Option<&Path>, force: bool) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => BridgeConfig::default_path().ok_or_else(|| {
            BridgeError::Configuration("Cannot determine the config directory".to_string())
        })?,
    };

    if path.exists() && !force {
        return Err(BridgeError::Configuration(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    BridgeConfig::default().to_file(&path)?;
    print_success(&format!("Wrote {}", path.display()));
    Ok(())
}

async fn handle_command(command: Commands, config: &BridgeConfig, json: bool) -> Result<()> {
    let delegate = ResourceDelegate::connect(config).await?;

    match command {
        Commands::NewJobId => {
            let session = delegate.new_job_id().await?;
            println!("{}", session.job_id());
            Ok(())
        }
        Commands::Submit { context, wait } => {
            let context = read_context(&context)?;
            let session = delegate.new_job_id().await?;
            let application_id = delegate.submit_application(session, context).await?;
            if !json {
                print_info(&format!("Submitted {}", application_id));
            }
            wait_for_master(&delegate, &application_id, &wait, json).await
        }
        Commands::Wait {
            application_id,
            wait,
        } => wait_for_master(&delegate, &application_id, &wait, json).await,
        Commands::Jobs => {
            let jobs = delegate.get_all_jobs().await?;
            emit(json, &jobs, || {
                println!("{}", jobs_table(&jobs));
                let (active, complete) = job_counts(&jobs);
                print_info(&format!("{} active, {} complete", active, complete));
            })
        }
        Commands::Trackers => {
            let trackers = delegate.get_active_trackers().await?;
            emit(json, &trackers, || println!("{}", trackers_table(&trackers)))
        }
        Commands::Metrics => {
            let metrics = delegate.get_cluster_metrics().await?;
            emit(json, &metrics, || println!("{}", metrics_table(&metrics)))
        }
        Commands::Queues { root, children } => {
            let queues = match (root, children) {
                (_, Some(parent)) => delegate.get_child_queues(&parent).await?,
                (true, None) => delegate.get_root_queues().await?,
                (false, None) => delegate.get_queues().await?,
            };
            emit(json, &queues, || println!("{}", queues_table(&queues)))
        }
        Commands::Queue { name } => {
            let queue = delegate.get_queue(&name).await?;
            emit(json, &queue, || {
                section_header(&queue.queue_name);
                println!("{}", queues_table(std::slice::from_ref(&queue)));
                if !queue.job_statuses.is_empty() {
                    println!("{}", jobs_table(&queue.job_statuses));
                }
            })
        }
        Commands::StagingDir => {
            println!("{}", delegate.get_staging_area_dir()?.display());
            Ok(())
        }
        Commands::SystemDir { clean } => {
            let dir = if clean {
                delegate.ensure_clean_system_dir().await?
            } else {
                delegate.system_dir().to_path_buf()
            };
            println!("{}", dir.display());
            Ok(())
        }
        Commands::ConfigInit { .. } | Commands::Completions { .. } => Ok(()),
    }
}

fn read_context(path: &Path) -> Result<ApplicationSubmissionContext> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        BridgeError::Configuration(format!("Cannot read {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&contents)?)
}

/// Poll the coordinator; Ctrl-C cancels the wait
async fn wait_for_master(
    delegate: &ResourceDelegate,
    application_id: &ApplicationId,
    args: &WaitArgs,
    json: bool,
) -> Result<()> {
    let delegate = match args.deadline_secs {
        Some(secs) => delegate
            .clone()
            .with_poll_policy(delegate.poll_policy().with_deadline(Duration::from_secs(secs))),
        None => delegate.clone(),
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let master = delegate.get_application_master(application_id, &cancel).await?;
    emit(json, &master, || print_master(&master))
}

fn print_master(master: &ApplicationMaster) {
    section_header(&master.application_id.to_string());
    let mut items = vec![
        ("State", master.state.to_string()),
        ("Job state", convert::job_state(master.state).to_string()),
        ("Host", format!("{}:{}", master.host, master.rpc_port)),
    ];
    if !master.tracking_url.is_empty() {
        items.push(("Tracking URL", master.tracking_url.clone()));
    }
    if !master.diagnostics.is_empty() {
        items.push(("Diagnostics", master.diagnostics.clone()));
    }
    println!("{}", stats_table(&items));

    if master.state.is_terminal() {
        print_warning(&format!(
            "Application finished before its coordinator came up ({})",
            master.state
        ));
    }
}

/// Print `value` as JSON, or run the table printer
fn emit<T: Serialize>(json: bool, value: &T, print_table: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print_table();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestions_for_actionable_errors() {
        assert!(suggestion(&BridgeError::Transport("refused".to_string()))
            .is_some_and(|hint| hint.contains("--rm-address")));
        assert!(suggestion(&BridgeError::Configuration("bad".to_string())).is_some());
        assert!(suggestion(&BridgeError::Unsupported("get_blacklisted_trackers")).is_none());
    }

    #[test]
    fn test_wait_accepts_job_and_application_ids() {
        let from_job = parse_application_id("job_1315895242400_0001").unwrap();
        let from_app = parse_application_id("application_1315895242400_0001").unwrap();
        assert_eq!(from_job, from_app);
        assert!(parse_application_id("task_1_1").is_err());
    }
}
