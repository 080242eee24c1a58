#![allow(clippy::struct_excessive_bools, clippy::redundant_pub_crate)]
#![forbid(unsafe_code)]

use crate::config::VigilAction;
use clap::Parser;
use config::Args;
use print::Artifact;
use std::process::ExitCode;

mod app;
mod config;
mod console;
mod print;
#[cfg(unix)]
mod system_log;

/// Configuration or usage error, including having nothing to monitor.
const EXIT_USAGE: u8 = 1;

/// The probing engine could not acquire its sockets.
const EXIT_BIND: u8 = 2;

/// More targets than can be monitored.
const EXIT_TOO_MANY_TARGETS: u8 = 3;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let artifact = match VigilAction::from(args)? {
        VigilAction::Vigil(cfg) => return app::run_vigil(&cfg),
        VigilAction::PrintConfigTemplate => Artifact::ConfigTemplate,
        VigilAction::PrintManPage => Artifact::ManPage,
        VigilAction::PrintShellCompletions(shell) => Artifact::ShellCompletions(shell),
    };
    println!("{}", artifact.render()?);
    Ok(())
}

/// Map the root cause of a fatal error to the process exit code.
fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<vigil_probe::Error>() {
            if err.is_bind() {
                return EXIT_BIND;
            }
        }
        if let Some(vigil_core::Error::TooManyTargets) = cause.downcast_ref::<vigil_core::Error>()
        {
            return EXIT_TOO_MANY_TARGETS;
        }
    }
    EXIT_USAGE
}
