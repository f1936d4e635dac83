//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG: &str = "probe.yaml";

/// Assertion-oriented HTTP contract testing.
#[derive(Debug, Parser)]
#[command(name = "probe", version, about)]
pub struct Cli {
    /// Configuration file (YAML or JSON).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless `RUST_LOG` is set.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run scenario files and write a report.
    Run {
        /// Only run scenarios whose feature or scenario name contains TEXT.
        #[arg(long, value_name = "TEXT")]
        grep: Option<String>,

        /// Directory receiving report.json.
        #[arg(long, short, value_name = "DIR")]
        output: Option<PathBuf>,
    },
    /// List features and scenarios without running them.
    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_run_arguments() {
        let cli = Cli::try_parse_from([
            "probe",
            "run",
            "--grep",
            "GitHub",
            "--output",
            "out",
            "--config",
            "ci/probe.yaml",
        ]);
        let cli = match cli {
            Ok(cli) => cli,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(cli.config, Some(PathBuf::from("ci/probe.yaml")));
        match cli.command {
            Command::Run { grep, output } => {
                assert_eq!(grep.as_deref(), Some("GitHub"));
                assert_eq!(output, Some(PathBuf::from("out")));
            }
            Command::List => panic!("expected run"),
        }
    }

    #[test]
    fn test_list_with_verbose() {
        let cli = Cli::try_parse_from(["probe", "-v", "list"]);
        assert!(matches!(
            cli,
            Ok(Cli {
                verbose: true,
                command: Command::List,
                ..
            })
        ));
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["probe"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
