use anyhow::anyhow;
use clap::ValueEnum;
use clap_complete::Shell;
use file::ConfigFile;
use serde::Deserialize;
use std::time::Duration;
use vigil_core::{defaults as report_defaults, validate_date_format, MonitorConfig};
use vigil_probe::{defaults as probe_defaults, ProbeConfig, MAX_PAYLOAD_SIZE};

mod cmd;
mod constants;
mod file;

pub use cmd::Args;

/// How to format log data.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// Display log data in a compact format.
    Compact,
    /// Display log data in a pretty format.
    Pretty,
    /// Display log data in a json format.
    Json,
}

/// How to log event spans.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogSpanEvents {
    /// Do not display event spans.
    Off,
    /// Display enter and exit event spans.
    Active,
    /// Display all event spans.
    Full,
}

/// The action to perform.
#[derive(Debug, Eq, PartialEq)]
pub enum VigilAction {
    /// Run Vigil.
    Vigil(VigilConfig),
    /// Print a template toml config file and exit.
    PrintConfigTemplate,
    /// Generate shell completion and exit.
    PrintShellCompletions(Shell),
    /// Generate a man page and exit.
    PrintManPage,
}

impl VigilAction {
    pub fn from(args: Args) -> anyhow::Result<Self> {
        Ok(if args.print_config_template {
            Self::PrintConfigTemplate
        } else if let Some(shell) = args.generate {
            Self::PrintShellCompletions(shell)
        } else if args.generate_man {
            Self::PrintManPage
        } else {
            Self::Vigil(VigilConfig::from(args)?)
        })
    }
}

/// Fully parsed and validated configuration.
#[derive(Debug, Eq, PartialEq)]
pub struct VigilConfig {
    pub targets: Vec<String>,
    pub targets_file: Option<String>,
    pub ping_interval: Duration,
    pub ping_timeout: Duration,
    pub payload_size: usize,
    pub report_interval: Duration,
    pub stop_after: Option<Duration>,
    pub tolerance: bool,
    pub summary: bool,
    pub ignore_no_loss: bool,
    pub syslog: bool,
    pub date_format: String,
    pub verbose: bool,
    pub log_format: LogFormat,
    pub log_filter: String,
    pub log_span_events: LogSpanEvents,
}

impl VigilConfig {
    pub fn from(args: Args) -> anyhow::Result<Self> {
        let cfg_file = if let Some(cfg) = &args.config_file {
            file::read_config_file(cfg)?
        } else {
            file::read_default_config_file()?.unwrap_or_default()
        };
        Self::build_config(args, cfg_file)
    }

    /// The probing engine configuration.
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            ping_interval: self.ping_interval,
            ping_timeout: self.ping_timeout,
            payload_size: self.payload_size,
            ..ProbeConfig::default()
        }
    }

    /// The monitor configuration.
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            report_interval: self.report_interval,
            tolerance: self.tolerance,
            summary: self.summary,
            ignore_no_loss: self.ignore_no_loss,
            date_format: self.date_format.clone(),
            log_sink: self.syslog,
        }
    }

    fn build_config(args: Args, cfg_file: ConfigFile) -> anyhow::Result<Self> {
        let cfg_file_vigil = cfg_file.vigil.unwrap_or_default();
        let cfg_file_probe = cfg_file.probe.unwrap_or_default();
        let cfg_file_report = cfg_file.report.unwrap_or_default();
        let verbose = args.verbose;
        let log_format = cfg_layer(
            args.log_format,
            cfg_file_vigil.log_format,
            constants::DEFAULT_LOG_FORMAT,
        );
        let log_filter = cfg_layer(
            args.log_filter,
            cfg_file_vigil.log_filter,
            String::from(constants::DEFAULT_LOG_FILTER),
        );
        let log_span_events = cfg_layer(
            args.log_span_events,
            cfg_file_vigil.log_span_events,
            constants::DEFAULT_LOG_SPAN_EVENTS,
        );
        let stop_after = cfg_layer_opt(args.stop_after, cfg_file_vigil.stop_after);
        let ping_interval = cfg_layer(
            args.ping_interval,
            cfg_file_probe.ping_interval,
            probe_defaults::DEFAULT_PING_INTERVAL,
        );
        let ping_timeout = cfg_layer(
            args.ping_timeout,
            cfg_file_probe.ping_timeout,
            probe_defaults::DEFAULT_PING_TIMEOUT,
        );
        let payload_size = cfg_layer(
            args.size,
            cfg_file_probe.payload_size,
            probe_defaults::DEFAULT_PAYLOAD_SIZE,
        );
        let report_interval = cfg_layer(
            args.report_interval,
            cfg_file_report.report_interval,
            report_defaults::DEFAULT_REPORT_INTERVAL,
        );
        let tolerance = cfg_layer_bool_flag(
            args.tolerance,
            cfg_file_report.tolerance,
            report_defaults::DEFAULT_TOLERANCE,
        );
        let summary = !cfg_layer_bool_flag(
            args.no_summary,
            cfg_file_report.summary.map(|summary| !summary),
            !report_defaults::DEFAULT_SUMMARY,
        );
        let ignore_no_loss = !cfg_layer_bool_flag(
            args.show_all,
            cfg_file_report.ignore_no_loss.map(|ignore| !ignore),
            !report_defaults::DEFAULT_IGNORE_NO_LOSS,
        );
        let syslog = cfg_layer_bool_flag(
            args.syslog,
            cfg_file_report.syslog,
            report_defaults::DEFAULT_LOG_SINK,
        );
        let date_format = cfg_layer(
            args.date_format,
            cfg_file_report.date_format,
            String::from(report_defaults::DEFAULT_DATE_FORMAT),
        );
        validate_duration("ping-interval", ping_interval)?;
        validate_duration("ping-timeout", ping_timeout)?;
        validate_duration("report-interval", report_interval)?;
        if let Some(stop_after) = stop_after {
            validate_duration("stop-after", stop_after)?;
        }
        validate_payload_size(payload_size)?;
        validate_date(&date_format)?;
        validate_syslog(syslog)?;
        Ok(Self {
            targets: args.targets,
            targets_file: args.file,
            ping_interval,
            ping_timeout,
            payload_size,
            report_interval,
            stop_after,
            tolerance,
            summary,
            ignore_no_loss,
            syslog,
            date_format,
            verbose,
            log_format,
            log_filter,
            log_span_events,
        })
    }
}

impl Default for VigilConfig {
    fn default() -> Self {
        Self {
            targets: vec![],
            targets_file: None,
            ping_interval: probe_defaults::DEFAULT_PING_INTERVAL,
            ping_timeout: probe_defaults::DEFAULT_PING_TIMEOUT,
            payload_size: probe_defaults::DEFAULT_PAYLOAD_SIZE,
            report_interval: report_defaults::DEFAULT_REPORT_INTERVAL,
            stop_after: None,
            tolerance: report_defaults::DEFAULT_TOLERANCE,
            summary: report_defaults::DEFAULT_SUMMARY,
            ignore_no_loss: report_defaults::DEFAULT_IGNORE_NO_LOSS,
            syslog: report_defaults::DEFAULT_LOG_SINK,
            date_format: String::from(report_defaults::DEFAULT_DATE_FORMAT),
            verbose: false,
            log_format: constants::DEFAULT_LOG_FORMAT,
            log_filter: String::from(constants::DEFAULT_LOG_FILTER),
            log_span_events: constants::DEFAULT_LOG_SPAN_EVENTS,
        }
    }
}

fn cfg_layer<T>(fst: Option<T>, snd: Option<T>, def: T) -> T {
    match (fst, snd) {
        (Some(val), _) | (None, Some(val)) => val,
        (None, None) => def,
    }
}

fn cfg_layer_opt<T>(fst: Option<T>, snd: Option<T>) -> Option<T> {
    match (fst, snd) {
        (Some(val), _) | (None, Some(val)) => Some(val),
        (None, None) => None,
    }
}

const fn cfg_layer_bool_flag(fst: bool, snd: Option<bool>, default: bool) -> bool {
    match (fst, snd) {
        (true, _) => true,
        (false, Some(val)) => val,
        (false, None) => default,
    }
}

/// Validate that a duration option is non-zero.
fn validate_duration(name: &str, duration: Duration) -> anyhow::Result<()> {
    if duration.is_zero() {
        Err(anyhow!("{name} ({duration:?}) must be greater than zero"))
    } else {
        Ok(())
    }
}

/// Validate `payload_size`.
fn validate_payload_size(payload_size: usize) -> anyhow::Result<()> {
    if payload_size > MAX_PAYLOAD_SIZE {
        Err(anyhow!(
            "payload-size ({payload_size}) must be no greater than {MAX_PAYLOAD_SIZE}"
        ))
    } else {
        Ok(())
    }
}

/// Validate `date_format`.
fn validate_date(date_format: &str) -> anyhow::Result<()> {
    validate_date_format(date_format)
        .map_err(|_| anyhow!("date-format ({date_format}) is not a valid format string"))
}

/// The system log is only available on unix platforms.
fn validate_syslog(syslog: bool) -> anyhow::Result<()> {
    if syslog && !cfg!(unix) {
        Err(anyhow!("syslog is not supported on this platform"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_config_default() {
        let args = args(&["vigil", "example.com"]).unwrap();
        let config = VigilConfig::build_config(args, ConfigFile::default()).unwrap();
        let expected = VigilConfig {
            targets: vec![String::from("example.com")],
            ..VigilConfig::default()
        };
        pretty_assertions::assert_eq!(expected, config);
    }

    #[test]
    fn test_config_sample() {
        let args = args(&["vigil", "example.com"]).unwrap();
        let cfg_file: ConfigFile =
            toml::from_str(include_str!("../vigil-config-sample.toml")).unwrap();
        let config = VigilConfig::build_config(args, cfg_file).unwrap();
        let expected = VigilConfig {
            targets: vec![String::from("example.com")],
            ..VigilConfig::default()
        };
        pretty_assertions::assert_eq!(expected, config);
    }

    #[test]
    fn test_config_file_layer() {
        let args = args(&["vigil", "example.com", "--report-interval", "10s"]).unwrap();
        let cfg_file: ConfigFile = toml::from_str(
            r#"
            [vigil]
            stop-after = "1h"

            [probe]
            ping-interval = "500ms"

            [report]
            report-interval = "30s"
            ignore-no-loss = false
            summary = false
            "#,
        )
        .unwrap();
        let config = VigilConfig::build_config(args, cfg_file).unwrap();
        let expected = cfg()
            .stop_after(Some(Duration::from_secs(3600)))
            .ping_interval(Duration::from_millis(500))
            .report_interval(Duration::from_secs(10))
            .ignore_no_loss(false)
            .summary(false)
            .build();
        pretty_assertions::assert_eq!(expected, config);
    }

    #[test_case("vigil --version", Err(anyhow!(format!("vigil {}", clap::crate_version!()))); "show version")]
    #[test_case("vigil -V", Err(anyhow!(format!("vigil {}", clap::crate_version!()))); "show version short")]
    fn test_version_help(cmd: &str, expected: anyhow::Result<VigilConfig>) {
        compare(parse_config(cmd), expected);
    }

    #[test_case("vigil example.com", Ok(cfg().build()); "single target")]
    #[test_case("vigil example.com foo.com bar.com", Ok(cfg_multi().build()); "multiple targets")]
    #[test_case("vigil example.com -i 2s", Ok(cfg().ping_interval(Duration::from_secs(2)).build()); "single target before args")]
    #[test_case("vigil -i 2s example.com", Ok(cfg().ping_interval(Duration::from_secs(2)).build()); "single target after args")]
    #[test_case("vigil -f hosts.txt", Ok(VigilConfigBuilder::new(vec![]).targets_file(Some(String::from("hosts.txt"))).build()); "targets file only")]
    #[test_case("vigil example.com --file hosts.txt", Ok(cfg().targets_file(Some(String::from("hosts.txt"))).build()); "targets and file")]
    fn test_target(cmd: &str, expected: anyhow::Result<VigilConfig>) {
        compare(parse_config(cmd), expected);
    }

    #[test_case("vigil example.com --dummy", Err(anyhow!("error: unexpected argument '--dummy' found")); "invalid argument")]
    fn test_unexpected(cmd: &str, expected: anyhow::Result<VigilConfig>) {
        compare_lines(parse_config(cmd), expected, Some(0));
    }

    #[test_case("vigil example.com --ping-interval 250ms", Ok(cfg().ping_interval(Duration::from_millis(250)).build()); "custom ping interval")]
    #[test_case("vigil example.com -i 250ms", Ok(cfg().ping_interval(Duration::from_millis(250)).build()); "custom ping interval short")]
    #[test_case("vigil example.com --ping-interval 0s", Err(anyhow!("ping-interval (0ns) must be greater than zero")); "invalid zero ping interval")]
    #[test_case("vigil example.com --ping-timeout 1s", Ok(cfg().ping_timeout(Duration::from_secs(1)).build()); "custom ping timeout")]
    #[test_case("vigil example.com -t 1s", Ok(cfg().ping_timeout(Duration::from_secs(1)).build()); "custom ping timeout short")]
    #[test_case("vigil example.com --ping-timeout 0ms", Err(anyhow!("ping-timeout (0ns) must be greater than zero")); "invalid zero ping timeout")]
    #[test_case("vigil example.com --size 1200", Ok(cfg().payload_size(1200).build()); "custom payload size")]
    #[test_case("vigil example.com -s 0", Ok(cfg().payload_size(0).build()); "empty payload")]
    #[test_case("vigil example.com --size 65508", Err(anyhow!("payload-size (65508) must be no greater than 65507")); "invalid payload size")]
    fn test_probe(cmd: &str, expected: anyhow::Result<VigilConfig>) {
        compare(parse_config(cmd), expected);
    }

    #[test_case("vigil example.com --report-interval 1m", Ok(cfg().report_interval(Duration::from_secs(60)).build()); "custom report interval")]
    #[test_case("vigil example.com -r 1m", Ok(cfg().report_interval(Duration::from_secs(60)).build()); "custom report interval short")]
    #[test_case("vigil example.com -r 0s", Err(anyhow!("report-interval (0ns) must be greater than zero")); "invalid zero report interval")]
    #[test_case("vigil example.com --stop-after 10m", Ok(cfg().stop_after(Some(Duration::from_secs(600))).build()); "custom stop after")]
    #[test_case("vigil example.com -d 10m", Ok(cfg().stop_after(Some(Duration::from_secs(600))).build()); "custom stop after short")]
    #[test_case("vigil example.com -d 0s", Err(anyhow!("stop-after (0ns) must be greater than zero")); "invalid zero stop after")]
    #[test_case("vigil example.com --tolerance", Ok(cfg().tolerance(true).build()); "tolerance")]
    #[test_case("vigil example.com -T", Ok(cfg().tolerance(true).build()); "tolerance short")]
    #[test_case("vigil example.com --show-all", Ok(cfg().ignore_no_loss(false).build()); "show all")]
    #[test_case("vigil example.com -a", Ok(cfg().ignore_no_loss(false).build()); "show all short")]
    #[test_case("vigil example.com --no-summary", Ok(cfg().summary(false).build()); "no summary")]
    #[test_case("vigil example.com --date-format %H:%M", Ok(cfg().date_format("%H:%M").build()); "custom date format")]
    #[test_case("vigil example.com --date-format %Q", Err(anyhow!("date-format (%Q) is not a valid format string")); "invalid date format")]
    fn test_report(cmd: &str, expected: anyhow::Result<VigilConfig>) {
        compare(parse_config(cmd), expected);
    }

    #[cfg(unix)]
    #[test_case("vigil example.com --syslog", Ok(cfg().syslog(true).build()); "syslog")]
    #[test_case("vigil example.com -S", Ok(cfg().syslog(true).build()); "syslog short")]
    fn test_syslog(cmd: &str, expected: anyhow::Result<VigilConfig>) {
        compare(parse_config(cmd), expected);
    }

    #[test_case("vigil example.com --log-format compact", Ok(cfg().log_format(LogFormat::Compact).build()); "compact log format")]
    #[test_case("vigil example.com --log-format json", Ok(cfg().log_format(LogFormat::Json).build()); "json log format")]
    #[test_case("vigil example.com --log-filter vigil_probe=trace", Ok(cfg().log_filter("vigil_probe=trace").build()); "custom log filter")]
    #[test_case("vigil example.com --log-span-events full", Ok(cfg().log_span_events(LogSpanEvents::Full).build()); "full span events")]
    #[test_case("vigil example.com -v", Ok(cfg().verbose(true).build()); "verbose")]
    fn test_logging(cmd: &str, expected: anyhow::Result<VigilConfig>) {
        compare(parse_config(cmd), expected);
    }

    #[test_case("vigil example.com --log-format chrome"; "unknown log format")]
    #[test_case("vigil example.com --ping-interval soon"; "unparsable duration")]
    #[test_case("vigil example.com --size -1"; "negative payload size")]
    fn test_invalid_value(cmd: &str) {
        assert!(parse_config(cmd).is_err());
    }

    #[test_case("vigil --print-config-template", VigilAction::PrintConfigTemplate; "print config template")]
    #[test_case("vigil --generate-man", VigilAction::PrintManPage; "generate man page")]
    #[test_case("vigil --generate bash", VigilAction::PrintShellCompletions(Shell::Bash); "generate bash completions")]
    #[test_case("vigil --generate zsh", VigilAction::PrintShellCompletions(Shell::Zsh); "generate zsh completions")]
    fn test_action(cmd: &str, expected: VigilAction) {
        let action = VigilAction::from(parse(cmd).unwrap()).unwrap();
        pretty_assertions::assert_eq!(expected, action);
    }

    #[test]
    fn test_probe_and_monitor_config() {
        let config = cfg()
            .ping_interval(Duration::from_millis(200))
            .payload_size(8)
            .syslog(true)
            .tolerance(true)
            .build();
        let probe = config.probe_config();
        assert_eq!(Duration::from_millis(200), probe.ping_interval);
        assert_eq!(probe_defaults::DEFAULT_PING_TIMEOUT, probe.ping_timeout);
        assert_eq!(8, probe.payload_size);
        let monitor = config.monitor_config();
        assert!(monitor.log_sink);
        assert!(monitor.tolerance);
        assert!(monitor.summary);
        assert!(monitor.ignore_no_loss);
    }

    fn parse_config(cmd: &str) -> anyhow::Result<VigilConfig> {
        let args = parse(cmd)?;
        VigilConfig::build_config(args, ConfigFile::default())
    }

    fn parse(cmd: &str) -> anyhow::Result<Args> {
        use clap::Parser;
        Ok(Args::try_parse_from(
            cmd.split(' ').map(std::ffi::OsString::from),
        )?)
    }

    fn args(args: &[&str]) -> anyhow::Result<Args> {
        use clap::Parser;
        Ok(Args::try_parse_from(
            args.iter().map(std::ffi::OsString::from),
        )?)
    }

    fn compare<T>(actual: anyhow::Result<T>, expected: anyhow::Result<T>)
    where
        T: PartialEq + Eq + std::fmt::Debug,
    {
        compare_lines(actual, expected, None);
    }

    fn compare_lines<T>(
        actual: anyhow::Result<T>,
        expected: anyhow::Result<T>,
        lines: Option<usize>,
    ) where
        T: PartialEq + Eq + std::fmt::Debug,
    {
        match (actual, expected) {
            (Ok(cfg), Ok(exp)) => {
                pretty_assertions::assert_eq!(cfg, exp);
            }
            (Err(err), Err(exp_err)) => {
                let (err, exp_err) = match lines {
                    Some(line) => (nth_line(&err, line), nth_line(&exp_err, line)),
                    None => (err.to_string(), exp_err.to_string()),
                };
                pretty_assertions::assert_eq!(remove_whitespace(&err), remove_whitespace(&exp_err));
            }
            (Ok(_), Err(exp_err)) => {
                panic!("expected err {}", exp_err.to_string().trim());
            }
            (Err(err), Ok(_)) => {
                panic!("unexpected err {}", err.to_string().trim());
            }
        }
    }

    fn nth_line(err: &anyhow::Error, line: usize) -> String {
        err.to_string()
            .lines()
            .nth(line)
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    fn remove_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn cfg() -> VigilConfigBuilder {
        VigilConfigBuilder::new(vec![String::from("example.com")])
    }

    fn cfg_multi() -> VigilConfigBuilder {
        VigilConfigBuilder::new(vec![
            String::from("example.com"),
            String::from("foo.com"),
            String::from("bar.com"),
        ])
    }

    pub struct VigilConfigBuilder {
        config: VigilConfig,
    }

    impl VigilConfigBuilder {
        pub fn new(targets: Vec<String>) -> Self {
            Self {
                config: VigilConfig {
                    targets,
                    ..VigilConfig::default()
                },
            }
        }

        pub fn targets_file(self, targets_file: Option<String>) -> Self {
            Self {
                config: VigilConfig {
                    targets_file,
                    ..self.config
                },
            }
        }

        pub fn ping_interval(self, ping_interval: Duration) -> Self {
            Self {
                config: VigilConfig {
                    ping_interval,
                    ..self.config
                },
            }
        }

        pub fn ping_timeout(self, ping_timeout: Duration) -> Self {
            Self {
                config: VigilConfig {
                    ping_timeout,
                    ..self.config
                },
            }
        }

        pub fn payload_size(self, payload_size: usize) -> Self {
            Self {
                config: VigilConfig {
                    payload_size,
                    ..self.config
                },
            }
        }

        pub fn report_interval(self, report_interval: Duration) -> Self {
            Self {
                config: VigilConfig {
                    report_interval,
                    ..self.config
                },
            }
        }

        pub fn stop_after(self, stop_after: Option<Duration>) -> Self {
            Self {
                config: VigilConfig {
                    stop_after,
                    ..self.config
                },
            }
        }

        pub fn tolerance(self, tolerance: bool) -> Self {
            Self {
                config: VigilConfig {
                    tolerance,
                    ..self.config
                },
            }
        }

        pub fn summary(self, summary: bool) -> Self {
            Self {
                config: VigilConfig {
                    summary,
                    ..self.config
                },
            }
        }

        pub fn ignore_no_loss(self, ignore_no_loss: bool) -> Self {
            Self {
                config: VigilConfig {
                    ignore_no_loss,
                    ..self.config
                },
            }
        }

        pub fn syslog(self, syslog: bool) -> Self {
            Self {
                config: VigilConfig {
                    syslog,
                    ..self.config
                },
            }
        }

        pub fn date_format(self, date_format: &str) -> Self {
            Self {
                config: VigilConfig {
                    date_format: String::from(date_format),
                    ..self.config
                },
            }
        }

        pub fn verbose(self, verbose: bool) -> Self {
            Self {
                config: VigilConfig {
                    verbose,
                    ..self.config
                },
            }
        }

        pub fn log_format(self, log_format: LogFormat) -> Self {
            Self {
                config: VigilConfig {
                    log_format,
                    ..self.config
                },
            }
        }

        pub fn log_filter(self, log_filter: &str) -> Self {
            Self {
                config: VigilConfig {
                    log_filter: String::from(log_filter),
                    ..self.config
                },
            }
        }

        pub fn log_span_events(self, log_span_events: LogSpanEvents) -> Self {
            Self {
                config: VigilConfig {
                    log_span_events,
                    ..self.config
                },
            }
        }

        pub fn build(self) -> VigilConfig {
            self.config
        }
    }
}
