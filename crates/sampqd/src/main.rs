// # sampq - SA-MP / open.mp server browser CLI
//
// Thin integration layer over sampq-core:
// 1. Read configuration from environment variables
// 2. Initialize logging and the runtime
// 3. Register monitoring gateways and build the ServerListService
// 4. Run one subcommand and print its result as JSON on stdout
//
// No query or parsing logic lives here.
//
// ## Configuration
//
// - `SAMPQ_GATEWAY`: Active monitoring gateway (samonitor, openmp)
// - `SAMPQ_SAMONITOR_URL`: SAMonitor API base URL
// - `SAMPQ_OPENMP_URL`: open.mp monitor API base URL
// - `SAMPQ_QUERY_TIMEOUT_MS`: Receive deadline per UDP exchange
// - `SAMPQ_PLAYER_LIST_LIMIT`: Skip player lists above this many players
// - `SAMPQ_MIN_PORT` / `SAMPQ_MAX_PORT`: Accepted port window
// - `SAMPQ_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export SAMPQ_GATEWAY=openmp
// sampq list --limit 20
// sampq full 127.0.0.1:7777
// ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sampq_core::config::{DEFAULT_OPENMP_URL, DEFAULT_SAMONITOR_URL};
use sampq_core::model::DEFAULT_PORT;
use sampq_core::{
    CancellationToken, GatewayConfig, GatewayRegistry, GatewayResponse, PortPolicy, QueryConfig,
    SampqConfig, ServerAddress, ServerListService,
};
use sampq_query::QueryAdapter;
use serde::Serialize;
use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampqExitCode {
    /// Command completed (or was interrupted by the user)
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// The command produced no data or failed at runtime
    RuntimeError = 2,
}

impl From<SampqExitCode> for ExitCode {
    fn from(code: SampqExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Query SA-MP and open.mp servers
#[derive(Parser, Debug)]
#[command(name = "sampq", author, version, about)]
struct Cli {
    /// Monitoring gateway to use (overrides SAMPQ_GATEWAY)
    #[arg(long, global = true)]
    gateway: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// List servers known to the monitoring gateway
    List {
        /// Print at most this many servers
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Basic information and ping for one server
    Info {
        /// host[:port]
        address: String,
        /// Ask the monitoring gateway instead of the server
        #[arg(long)]
        monitored: bool,
    },
    /// Information, rules and players for one server
    Full {
        /// host[:port]
        address: String,
    },
    /// Player list of one server
    Players {
        /// host[:port]
        address: String,
        /// Ask the monitoring gateway instead of the server
        #[arg(long)]
        monitored: bool,
    },
    /// Probe whether a server runs open.mp
    Omp {
        /// host[:port]
        address: String,
    },
    /// Query many servers concurrently, one JSON line per server
    Refresh {
        /// host[:port] list
        #[arg(required = true)]
        addresses: Vec<String>,
    },
    /// List registered monitoring gateways
    Gateways,
}

/// Application configuration
#[derive(Debug, Clone)]
struct Config {
    gateway: String,
    samonitor_url: String,
    openmp_url: String,
    query_timeout_ms: u64,
    player_list_limit: u32,
    min_port: u16,
    max_port: u16,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = SampqConfig::default();
        Ok(Self {
            gateway: lookup("SAMPQ_GATEWAY").unwrap_or(defaults.active_gateway),
            samonitor_url: lookup("SAMPQ_SAMONITOR_URL")
                .unwrap_or_else(|| DEFAULT_SAMONITOR_URL.to_string()),
            openmp_url: lookup("SAMPQ_OPENMP_URL")
                .unwrap_or_else(|| DEFAULT_OPENMP_URL.to_string()),
            query_timeout_ms: parse_var(
                &lookup,
                "SAMPQ_QUERY_TIMEOUT_MS",
                defaults.query.timeout_ms,
            )?,
            player_list_limit: parse_var(
                &lookup,
                "SAMPQ_PLAYER_LIST_LIMIT",
                defaults.query.player_list_limit,
            )?,
            min_port: parse_var(&lookup, "SAMPQ_MIN_PORT", defaults.ports.min_port)?,
            max_port: parse_var(&lookup, "SAMPQ_MAX_PORT", defaults.ports.max_port)?,
            log_level: lookup("SAMPQ_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.log_level().is_none() {
            anyhow::bail!(
                "SAMPQ_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            );
        }

        self.to_sampq_config()
            .validate()
            .context("Invalid sampq configuration")?;

        Ok(())
    }

    fn log_level(&self) -> Option<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }

    fn to_sampq_config(&self) -> SampqConfig {
        SampqConfig {
            gateways: vec![
                GatewayConfig::SaMonitor {
                    base_url: self.samonitor_url.clone(),
                },
                GatewayConfig::OpenMp {
                    base_url: self.openmp_url.clone(),
                },
            ],
            active_gateway: self.gateway.clone(),
            query: QueryConfig {
                timeout_ms: self.query_timeout_ms,
                default_port: DEFAULT_PORT,
                player_list_limit: self.player_list_limit,
            },
            ports: PortPolicy {
                min_port: self.min_port,
                max_port: self.max_port,
            },
        }
    }
}

fn parse_var<T>(lookup: impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

/// What a command produced
#[derive(Debug)]
enum Outcome {
    Printed,
    NoData(String),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return SampqExitCode::ConfigError.into();
        }
    };
    if let Some(gateway) = &cli.gateway {
        config.gateway = gateway.clone();
    }

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return SampqExitCode::ConfigError.into();
    }

    // Logs go to stderr; stdout carries JSON only
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level().unwrap_or(Level::INFO))
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SampqExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SampqExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let service = match build_service(&config) {
            Ok(service) => service,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return SampqExitCode::ConfigError;
            }
        };

        let token = CancellationToken::new();
        tokio::spawn({
            let token = token.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupted, cancelling");
                    token.cancel();
                }
            }
        });

        match run_command(&service, &cli, &token).await {
            Ok(Outcome::Printed) => SampqExitCode::Success,
            Ok(Outcome::NoData(reason)) => {
                error!("{}", reason);
                SampqExitCode::RuntimeError
            }
            Err(e)
                if e
                    .downcast_ref::<sampq_core::Error>()
                    .is_some_and(sampq_core::Error::is_cancelled) =>
            {
                info!("Cancelled");
                SampqExitCode::Success
            }
            Err(e) => {
                error!("Command failed: {:#}", e);
                SampqExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Registry with every gateway compiled into this binary
fn registry() -> GatewayRegistry {
    let registry = GatewayRegistry::new();

    #[cfg(feature = "samonitor")]
    {
        debug!("Registering SAMonitor gateway");
        sampq_monitor_samonitor::register(&registry);
    }

    #[cfg(feature = "openmp")]
    {
        debug!("Registering open.mp gateway");
        sampq_monitor_openmp::register(&registry);
    }

    registry
}

fn build_service(config: &Config) -> Result<ServerListService> {
    let sampq_config = config.to_sampq_config();
    let active = sampq_config
        .active()
        .context("Active gateway is not configured")?;

    let gateway = registry()
        .create_gateway(active)
        .with_context(|| format!("Cannot create gateway '{}'", active.type_name()))?;
    let query = Arc::new(QueryAdapter::from_config(&sampq_config.query));

    info!("Using monitoring gateway: {}", gateway.name());
    Ok(ServerListService::from_config(
        gateway,
        query,
        &sampq_config,
    )?)
}

async fn run_command(
    service: &ServerListService,
    cli: &Cli,
    token: &CancellationToken,
) -> Result<Outcome> {
    let pretty = cli.pretty;

    match &cli.command {
        Command::List { limit } => {
            let servers = match service.list_servers(token).await? {
                GatewayResponse::Data(servers) => servers,
                other => return Ok(gateway_miss(service, &other)),
            };
            let shown = limit.unwrap_or(servers.len()).min(servers.len());
            print_json(&servers[..shown], pretty)?;
            Ok(Outcome::Printed)
        }
        Command::Info { address, monitored } => {
            if *monitored {
                let Some(address) = monitored_address(address) else {
                    return Ok(invalid_address(address));
                };
                match service
                    .get_monitored_server_info(address.host(), address.port(), token)
                    .await?
                {
                    GatewayResponse::Data(record) => print_outcome(&record, pretty),
                    other => Ok(gateway_miss(service, &other)),
                }
            } else {
                match service.get_server_info_at(address, token).await? {
                    Some(record) => print_outcome(&record, pretty),
                    None => Ok(no_answer(address)),
                }
            }
        }
        Command::Full { address } => match service.get_full_server_info_at(address, token).await? {
            Some(record) => print_outcome(&record, pretty),
            None => Ok(no_answer(address)),
        },
        Command::Players { address, monitored } => {
            if *monitored {
                let Some(address) = monitored_address(address) else {
                    return Ok(invalid_address(address));
                };
                match service
                    .get_monitored_players(address.host(), address.port(), token)
                    .await?
                {
                    GatewayResponse::Data(players) => print_outcome(&players, pretty),
                    other => Ok(gateway_miss(service, &other)),
                }
            } else {
                match service.get_server_players_at(address, token).await? {
                    Some(players) => print_outcome(&players, pretty),
                    None => Ok(no_answer(address)),
                }
            }
        }
        Command::Omp { address } => {
            let Ok(parsed) = ServerAddress::parse_with_default(address, DEFAULT_PORT) else {
                return Ok(invalid_address(address));
            };
            match service
                .is_open_mp(parsed.host(), parsed.port(), token)
                .await?
            {
                Some(open_mp) => print_outcome(
                    &serde_json::json!({ "address": parsed.to_string(), "open_mp": open_mp }),
                    pretty,
                ),
                None => Ok(no_answer(address)),
            }
        }
        Command::Refresh { addresses } => {
            let mut records = service.refresh(addresses.clone(), token);
            while let Some(record) = records.next().await {
                print_json(&record, false)?;
            }
            if token.is_cancelled() {
                return Err(sampq_core::Error::Cancelled.into());
            }
            Ok(Outcome::Printed)
        }
        Command::Gateways => {
            let active = service.gateway_name();
            let gateways: Vec<_> = registry()
                .list_gateways()
                .into_iter()
                .map(|name| serde_json::json!({ "active": name == active, "name": name }))
                .collect();
            print_outcome(&gateways, pretty)
        }
    }
}

fn monitored_address(address: &str) -> Option<ServerAddress> {
    ServerAddress::parse_with_default(address, DEFAULT_PORT).ok()
}

fn invalid_address(address: &str) -> Outcome {
    Outcome::NoData(format!("Invalid server address: {address:?}"))
}

fn no_answer(address: &str) -> Outcome {
    Outcome::NoData(format!("No answer from {address}"))
}

fn gateway_miss<T>(service: &ServerListService, response: &GatewayResponse<T>) -> Outcome {
    let name = service.gateway_name();
    if response.is_unsupported() {
        Outcome::NoData(format!("Gateway '{name}' does not support this operation"))
    } else {
        Outcome::NoData(format!("Gateway '{name}' returned no data"))
    }
}

fn print_outcome<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<Outcome> {
    print_json(value, pretty)?;
    Ok(Outcome::Printed)
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
