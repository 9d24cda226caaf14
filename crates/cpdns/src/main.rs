// # cpdns - control-panel DNS reconciler
//
// Thin CLI around `cpdns_core::Engine`: parse arguments, build the run
// configuration, wire the collaborators, run one pass and echo the report.
//
// ## Usage
//
// ```bash
// cpdns --config /etc/cpdns.toml
// cpdns example.it secret esx1,esx2 --resolveonly
// cpdns --config /etc/cpdns.toml --ip 203.0.113.7 --quiet
// ```
//
// The report goes to stdout (unless `--quiet`); diagnostics go to stderr at
// the level given by `--log-level` / `CPDNS_LOG`.
//
// ## Exit codes
//
// - 0: run completed, including "nothing to do" and resolve-only runs
// - 1: usage or configuration error, panel login or record table failure
// - 2: public IP discovery failure

mod notify;

use anyhow::{Context, Result};
use clap::Parser;
use cpdns_core::{Engine, FileConfig, Pacer, RunAborted, RunConfig, RunOutcome, Stage};
use cpdns_ip_http::HttpIpSource;
use cpdns_panel_tophost::TophostPanel;
use cpdns_resolver_hickory::HickoryLookup;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

use crate::notify::SmtpNotifier;

/// Exit codes for the possible run endings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CpdnsExitCode {
    /// Run completed
    Success = 0,
    /// Usage, configuration or panel session failure
    Failure = 1,
    /// The desired IP could not be determined
    IpDiscoveryFailed = 2,
}

impl From<CpdnsExitCode> for ExitCode {
    fn from(code: CpdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl From<Stage> for CpdnsExitCode {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::IpDiscovery => CpdnsExitCode::IpDiscoveryFailed,
            Stage::Session => CpdnsExitCode::Failure,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "cpdns",
    version,
    about = "Keep control-panel DNS A records pointed at the current public IP"
)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Panel username (usually the domain)
    #[arg(requires_all = ["password", "records"])]
    username: Option<String>,

    /// Panel password
    password: Option<String>,

    /// Comma-separated record names, e.g. "esx1,esx2"
    records: Option<String>,

    /// Use this IP instead of discovering the public one
    #[arg(long, value_name = "ADDR")]
    ip: Option<String>,

    /// Only verify DNS, never touch the panel
    #[arg(long = "resolveonly", alias = "resolve-only")]
    resolve_only: bool,

    /// Do not echo the report on stdout
    #[arg(short, long)]
    quiet: bool,

    /// Send the notification even when nothing had to change
    #[arg(long)]
    always_notify: bool,

    /// Diagnostic log level on stderr
    #[arg(
        long,
        env = "CPDNS_LOG",
        default_value = "warn",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    log_level: String,
}

impl Cli {
    /// Build the run configuration from the file or the positionals
    fn run_config(&self) -> Result<RunConfig> {
        let config = match (&self.config, &self.username, &self.password, &self.records) {
            (Some(path), _, _, _) => {
                let file = FileConfig::from_path(path)
                    .with_context(|| format!("cannot load {}", path.display()))?;
                RunConfig::from_file(file)?
            }
            (None, Some(username), Some(password), Some(records)) => {
                RunConfig::from_positionals(username, password, records)?
            }
            _ => anyhow::bail!(
                "either --config <PATH> or the USERNAME PASSWORD RECORDS arguments are required"
            ),
        };

        Ok(config
            .with_ip_override(self.ip.clone())
            .with_resolve_only(self.resolve_only)
            .with_quiet(self.quiet)
            .with_always_notify(self.always_notify))
    }
}

fn log_level(name: &str) -> Level {
    match name.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                CpdnsExitCode::Failure.into()
            } else {
                CpdnsExitCode::Success.into()
            };
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(&cli.log_level))
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CpdnsExitCode::Failure.into();
    }

    let config = match cli.run_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return CpdnsExitCode::Failure.into();
        }
    };

    info!(
        "Managing {} record(s) in {} via {}",
        config.records.len(),
        config.domain,
        config.panel_url
    );

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CpdnsExitCode::Failure.into();
        }
    };

    let quiet = config.quiet;
    let result = rt.block_on(async {
        let mut engine = match build_engine(config) {
            Ok(engine) => engine,
            Err(e) => {
                eprintln!("Startup error: {:#}", e);
                return CpdnsExitCode::Failure;
            }
        };

        match engine.run().await {
            Ok(outcome) => finish(&outcome, quiet),
            Err(aborted) => abort(&aborted, quiet),
        }
    });

    result.into()
}

/// Wire the production collaborators around one shared pacer
fn build_engine(config: RunConfig) -> Result<Engine> {
    let pacer = Pacer::new(config.request_delay);

    let ip_source = HttpIpSource::new(config.ip_echo_url.clone())?;
    let lookup = HickoryLookup::new(&config.nameservers)?;
    let panel = TophostPanel::new(&config.panel_url, pacer.clone())?;
    debug!("Nameservers: {:?}", config.nameservers);

    let notifier = config.mail.as_ref().map(SmtpNotifier::new).transpose()?;

    let mut engine = Engine::new(
        config,
        Box::new(ip_source),
        Box::new(lookup),
        Box::new(panel),
        pacer,
    )?;
    if let Some(notifier) = notifier {
        engine = engine.with_notifier(Box::new(notifier));
    }

    Ok(engine)
}

fn finish(outcome: &RunOutcome, quiet: bool) -> CpdnsExitCode {
    if !quiet {
        print!("{}", outcome.report.render());
    }

    info!(
        "Run finished: {} planned, {} applied, {} failed",
        outcome.plan.len(),
        outcome.updates.len() - outcome.failed_updates(),
        outcome.failed_updates()
    );
    CpdnsExitCode::Success
}

fn abort(aborted: &RunAborted, quiet: bool) -> CpdnsExitCode {
    if !quiet {
        print!("{}", aborted.report.render());
    }

    error!("{}", aborted);
    aborted.stage.into()
}
