use crate::config::{LogFormat, LogSpanEvents, VigilConfig};
use crate::console::Console;
use anyhow::{anyhow, Context};
use crossbeam::channel::{after, bounded, never, select, Receiver};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::fmt::format::FmtSpan;
use vigil_core::{
    local_now, ConsoleSink, LogSink, Monitor, Prober, Reporter, Severity, TargetRegistry,
};
use vigil_probe::IcmpEngine;

/// Run the vigil application.
pub fn run_vigil(cfg: &VigilConfig) -> anyhow::Result<()> {
    configure_logging(cfg);
    let targets = read_targets(cfg)?;
    if targets.is_empty() {
        return Err(anyhow!("no targets to monitor"));
    }
    let engine = IcmpEngine::bind(cfg.probe_config())?;
    let registry = resolve_targets(&targets, &lookup_host)?;
    if registry.is_empty() {
        return Err(anyhow!(
            "failed to resolve any of the targets {}",
            targets.join(", ")
        ));
    }
    let addrs = registry
        .targets()
        .map(|target| (target.id(), target.addr()))
        .collect::<Vec<_>>();
    let termination = termination_signal()?;
    engine.start(&addrs)?;
    let prober: Arc<dyn Prober> = Arc::new(engine);
    let monitor_config = cfg.monitor_config();
    let reporter = Reporter::from_config(&monitor_config, Box::new(Console::new()), system_log())?;
    let start = local_now();
    let handle = Monitor::new(registry, monitor_config).spawn(prober, reporter)?;
    info!(targets = addrs.len(), "monitoring started");
    let reason = wait_for_termination(&termination, cfg.stop_after);
    Console::new().write_line(Severity::Ok, reason);
    let (monitor, mut reporter) = handle.shutdown()?;
    if let Some(summary) = monitor.summary(start, local_now()) {
        summary.render(&mut reporter);
    }
    Ok(())
}

/// Collect the targets from the command line and the targets file.
///
/// Blank lines and surrounding whitespace in the file are ignored.
fn read_targets(cfg: &VigilConfig) -> anyhow::Result<Vec<String>> {
    let mut targets = cfg.targets.clone();
    if let Some(path) = &cfg.targets_file {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read targets file: {path}"))?;
        targets.extend(parse_targets(&contents));
    }
    Ok(targets)
}

fn parse_targets(contents: &str) -> impl Iterator<Item = String> + '_ {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
}

/// Register each target which resolves to an address.
///
/// Targets which fail to resolve are reported and skipped.  Registering more
/// than the maximum number of targets is an error.
fn resolve_targets<F>(targets: &[String], lookup: &F) -> anyhow::Result<TargetRegistry>
where
    F: Fn(&str) -> anyhow::Result<IpAddr>,
{
    let mut registry = TargetRegistry::new();
    for target in targets {
        match lookup(target) {
            Ok(addr) => {
                let id = registry.register(target, addr)?;
                debug!(%id, target, %addr, "registered target");
            }
            Err(err) => {
                Console::new().write_line(
                    Severity::Warn,
                    &format!("failed to resolve target: {target} ({err})"),
                );
                registry.resolve_failed(target, &err.to_string());
            }
        }
    }
    Ok(registry)
}

/// Resolve a hostname or IP address, preferring the first address returned.
fn lookup_host(target: &str) -> anyhow::Result<IpAddr> {
    if let Ok(addr) = IpAddr::from_str(target) {
        return Ok(addr);
    }
    dns_lookup::lookup_host(target)?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("no addresses found"))
}

#[cfg(unix)]
fn system_log() -> Box<dyn LogSink> {
    Box::new(crate::system_log::SystemLog::new())
}

#[cfg(not(unix))]
fn system_log() -> Box<dyn LogSink> {
    Box::new(vigil_core::DisabledLog)
}

/// Install a handler for `SIGINT` and `SIGTERM`.
fn termination_signal() -> anyhow::Result<Receiver<()>> {
    let (tx, rx) = bounded(1);
    ctrlc::set_handler(move || {
        let _ = tx.try_send(());
    })?;
    Ok(rx)
}

/// Block until a termination signal arrives or `stop_after` elapses.
fn wait_for_termination(termination: &Receiver<()>, stop_after: Option<Duration>) -> &'static str {
    let deadline = stop_after.map_or_else(never, after);
    select! {
        recv(termination) -> _ => "received interrupt",
        recv(deadline) -> _ => "run duration elapsed",
    }
}

fn configure_logging(cfg: &VigilConfig) {
    if cfg.verbose {
        let fmt_span = match cfg.log_span_events {
            LogSpanEvents::Off => FmtSpan::NONE,
            LogSpanEvents::Active => FmtSpan::ACTIVE,
            LogSpanEvents::Full => FmtSpan::FULL,
        };
        let builder = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_span_events(fmt_span)
            .with_env_filter(&cfg.log_filter);
        match cfg.log_format {
            LogFormat::Compact => builder.compact().init(),
            LogFormat::Pretty => builder.pretty().init(),
            LogFormat::Json => builder.json().init(),
        }
    }
}
