use crate::config::{LogFormat, LogSpanEvents};
use clap::builder::Styles;
use clap::Parser;
use clap_complete::Shell;
use std::time::Duration;

/// Monitor the liveness of hosts and report packet loss
#[derive(Parser, Debug)]
#[command(name = "vigil", author, version, about, long_about = None, arg_required_else_help(true), styles=Styles::styled())]
pub struct Args {
    /// A space delimited list of hostnames and IPs to monitor
    #[arg(required_unless_present_any(["file", "print_config_template", "generate", "generate_man"]))]
    pub targets: Vec<String>,

    /// Read newline delimited hostnames and IPs to monitor from a file
    #[arg(short = 'f', long, value_hint = clap::ValueHint::FilePath)]
    pub file: Option<String>,

    /// Config file
    #[arg(short = 'c', long, value_hint = clap::ValueHint::FilePath)]
    pub config_file: Option<String>,

    /// The time between echo requests to each target [default: 1s]
    #[arg(short = 'i', long, value_parser = parse_duration)]
    pub ping_interval: Option<Duration>,

    /// The time to wait for an echo reply before it is counted as lost [default: 3s]
    #[arg(short = 't', long, value_parser = parse_duration)]
    pub ping_timeout: Option<Duration>,

    /// The time between liveness reports [default: 5s]
    #[arg(short = 'r', long, value_parser = parse_duration)]
    pub report_interval: Option<Duration>,

    /// The size of the echo request payload in bytes [default: 56]
    #[arg(short = 's', long)]
    pub size: Option<usize>,

    /// Stop monitoring after this duration [default: never]
    #[arg(short = 'd', long, value_parser = parse_duration)]
    pub stop_after: Option<Duration>,

    /// Do not report a single lost echo reply per interval for a host which is up [default: false]
    #[arg(short = 'T', long)]
    pub tolerance: bool,

    /// Include hosts without packet loss in the summary [default: false]
    #[arg(short = 'a', long)]
    pub show_all: bool,

    /// Do not print a loss summary on exit [default: false]
    #[arg(long)]
    pub no_summary: bool,

    /// Forward events to the system log [default: false]
    #[arg(short = 'S', long)]
    pub syslog: bool,

    /// The chrono format string used for event timestamps [default: %Y-%m-%d %H:%M:%S]
    #[arg(long)]
    pub date_format: Option<String>,

    /// Generate shell completion
    #[arg(long)]
    pub generate: Option<Shell>,

    /// Generate ROFF man page
    #[arg(long)]
    pub generate_man: bool,

    /// Print a template toml config file and exit
    #[arg(long)]
    pub print_config_template: bool,

    /// The debug log format [default: pretty]
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// The debug log filter [default: vigil=debug]
    #[arg(long)]
    pub log_filter: Option<String>,

    /// How to log event spans [default: off]
    #[arg(long)]
    pub log_span_events: Option<LogSpanEvents>,

    /// Enable verbose debug logging
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    Ok(humantime::parse_duration(value)?)
}
