/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod config;
mod error;
mod notifier;
mod store;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{ArgEnum, Parser, Subcommand};
use tokio::signal::unix::{signal, SignalKind};

use agent_utils::{Crypto, KeyVault, MasterKey};
use device_base::{DeviceId, DeviceStore};
use onvif_protocol::{OnvifClient, OnvifConfig};
use scheduler::{EventSink, ProbeRouter, Scheduler};
use snmp_protocol::{
    format_speed, SnmpAuth, SnmpClient, SnmpConfig, TFortisSwitch,
    TimingConfig, POE_RESTART_DELAY,
};

use config::AgentConfig;
use error::Result;
use notifier::LogNotifier;
use store::MemoryStore;

#[derive(Parser)]
#[clap(name = "netwatch-agent", version, author)]
#[clap(about = "Periodically probes registered network devices.")]
struct Args {
    /// Increase verbosity. This option can be specified multiple
    /// times. The maximum verbosity level is 3.
    #[clap(long = "verbose", short = 'v', parse(from_occurrences))]
    verbose: u8,
    /// Only log output from specific module(s).
    #[clap(long = "log-allow-module")]
    log_allow_module: Vec<String>,
    /// Ignore log output from specific module(s).
    #[clap(long = "log-ignore-module")]
    log_ignore_module: Vec<String>,
    /// Path to the config file (device catalog plus monitoring
    /// knobs).
    #[clap(long = "config", short = 'c', default_value = "netwatch.json")]
    config: PathBuf,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the monitoring engine (the default).
    Run {
        /// One immediate fan-out instead of the periodic loop.
        #[clap(long)]
        once: bool,
        /// Tick interval in seconds.
        #[clap(long)]
        interval: Option<f64>,
        /// ICMP/TCP probe timeout in seconds.
        #[clap(long = "ping-timeout")]
        ping_timeout: Option<f64>,
        /// SNMP request timeout in seconds.
        #[clap(long = "snmp-timeout")]
        snmp_timeout: Option<f64>,
        /// Parallel probe workers.
        #[clap(long)]
        workers: Option<usize>,
    },
    /// Discover an ONVIF camera: device info, profiles, stream and
    /// snapshot URIs.
    Discover {
        host: String,
        #[clap(long, default_value = "80")]
        port: u16,
        #[clap(long)]
        user: Option<String>,
        #[clap(long, default_value = "")]
        password: String,
    },
    /// Control PoE on a catalog switch port.
    Poe {
        /// Device id of the switch in the catalog.
        device: i64,
        /// Port number.
        port: u32,
        #[clap(long, arg_enum, default_value = "restart")]
        action: PoeAction,
    },
}

#[derive(ArgEnum, Clone, Copy, Debug)]
enum PoeAction {
    On,
    Off,
    Restart,
}

impl Args {
    fn verbosity(&self) -> simplelog::LevelFilter {
        match self.verbose {
            0 => simplelog::LevelFilter::Warn,
            1 => simplelog::LevelFilter::Info,
            2 => simplelog::LevelFilter::Debug,
            3.. => simplelog::LevelFilter::Trace,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut log_config = simplelog::ConfigBuilder::new();
    for module in &args.log_allow_module {
        log_config.add_filter_allow(module.to_string());
    }
    for module in &args.log_ignore_module {
        log_config.add_filter_ignore(module.to_string());
    }
    if let Err(e) = simplelog::TermLogger::init(
        args.verbosity(),
        log_config.build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    ) {
        eprintln!("failed to initialize logging: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(args).await {
        log::error!("{}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = AgentConfig::load(&args.config)?;

    let master_key = MasterKey::load_or_create(&config.master_key_file)?;
    let crypto = Arc::new(Crypto::new(&master_key));
    let store = Arc::new(MemoryStore::from_config(&config)?);
    let vault = KeyVault::new(store.clone(), crypto);

    match args.command.unwrap_or(Command::Run {
        once: false,
        interval: None,
        ping_timeout: None,
        snmp_timeout: None,
        workers: None,
    }) {
        Command::Run {
            once,
            interval,
            ping_timeout,
            snmp_timeout,
            workers,
        } => {
            let mut monitoring = config.monitoring;
            if let Some(interval) = interval {
                monitoring.interval = interval;
            }
            if let Some(ping_timeout) = ping_timeout {
                monitoring.ping_timeout = ping_timeout;
            }
            if let Some(snmp_timeout) = snmp_timeout {
                monitoring.snmp_timeout = snmp_timeout;
            }
            if let Some(workers) = workers {
                monitoring.workers = workers;
            }
            run_monitoring(store, vault, monitoring, once).await
        }
        Command::Discover {
            host,
            port,
            user,
            password,
        } => discover(host, port, user, password).await,
        Command::Poe {
            device,
            port,
            action,
        } => poe(store, DeviceId(device), port, action).await,
    }
}

async fn run_monitoring(
    store: Arc<MemoryStore>,
    vault: KeyVault,
    monitoring: scheduler::MonitorConfig,
    once: bool,
) -> Result<()> {
    let notifier = Arc::new(LogNotifier);
    let sink = Arc::new(EventSink::new(
        store.clone(),
        store.clone(),
        notifier.clone(),
    ));
    let router = Arc::new(ProbeRouter::new(
        store.clone(),
        vault,
        sink.clone(),
        monitoring,
    ));
    let engine = Scheduler::new(
        store.clone(),
        router,
        sink,
        notifier,
        monitoring,
    );

    if once {
        engine.run_once().await;
        for row in store.history_rows() {
            println!(
                "{} device {} {} {:.1} ms",
                row.created_at, row.device_id, row.status, row.latency_ms
            );
        }
        return Ok(());
    }

    engine.start().await;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => log::info!("received SIGINT; shutting down"),
        _ = sigterm.recv() => log::info!("received SIGTERM; shutting down"),
    }

    engine.stop().await;
    Ok(())
}

async fn discover(
    host: String,
    port: u16,
    user: Option<String>,
    password: String,
) -> Result<()> {
    let mut onvif_config = OnvifConfig::new(host, port);
    if let Some(user) = user {
        onvif_config = onvif_config.with_credentials(user, password);
    }
    let client = OnvifClient::create(onvif_config)?;
    let camera = client.discover_camera().await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&camera)
            .unwrap_or_else(|_| String::from("{}"))
    );
    Ok(())
}

async fn poe(
    store: Arc<MemoryStore>,
    device_id: DeviceId,
    port: u32,
    action: PoeAction,
) -> Result<()> {
    let device = store.get_by_id(device_id).await?;
    let switch_config = store
        .switch_config(device_id)
        .await?
        .ok_or_else(|| device_base::Error::DeviceNotFound(device_id))?;

    let auth = SnmpAuth::from_switch(&switch_config)?;
    let switch = TFortisSwitch::new(SnmpClient::new(
        SnmpConfig::new(device.ip, auth)
            .with_timing(TimingConfig::default()),
    ));

    match action {
        PoeAction::On => switch.set_poe_enabled(port, true).await?,
        PoeAction::Off => switch.set_poe_enabled(port, false).await?,
        PoeAction::Restart => {
            log::info!(
                "restarting PoE on {} port {} ({} s off-time)",
                device.name,
                port,
                POE_RESTART_DELAY.as_secs()
            );
            switch.restart_poe(port, POE_RESTART_DELAY).await?;
        }
    }
    let info = switch.get_poe_info(port).await?;
    let link = switch.get_port_info(port).await?;
    println!(
        "port {}: link {:?} at {}, PoE config {}, power {}, {} mW",
        port,
        link.status,
        format_speed(link.speed_bps),
        if info.config_enabled { "enabled" } else { "disabled" },
        if info.actual_up { "delivered" } else { "down" },
        info.power_mw
    );
    Ok(())
}
