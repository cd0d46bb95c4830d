// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command-line interface definitions.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sshm",
    version,
    about = "Session manager for a registry of SSH servers"
)]
pub struct Cli {
    /// Config file path (default: ~/.config/sshm/config.json)
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the server listing
    List,

    /// Open an interactive shell on a server
    Login {
        /// Address flag or server name
        server: String,
    },

    /// Run commands on a server and exit with the outcome code
    Run {
        /// Address flag or server name
        server: String,
        /// Commands, joined with && and a trailing exit
        #[arg(required = true)]
        commands: Vec<String>,
    },

    /// Copy a file or directory between here and a server
    Cp {
        /// Source endpoint, [server:]path
        source: String,
        /// Destination endpoint, [server:]path
        dest: String,
    },

    /// Add a server to the registry
    Add {
        /// Group prefix to add into; flat list when absent
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Edit the server at an address flag
    Edit {
        flag: String,
    },

    /// Remove the server at an address flag
    Remove {
        flag: String,
    },

    /// Obfuscate a password for storing in the config
    Encrypt {
        password: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_requires_at_least_one_command() {
        assert!(Cli::try_parse_from(["sshm", "run", "1"]).is_err());
        let cli = Cli::try_parse_from(["sshm", "run", "1", "ls", "pwd"]).unwrap();
        match cli.command {
            Command::Run { server, commands } => {
                assert_eq!(server, "1");
                assert_eq!(commands, ["ls", "pwd"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn verbosity_accumulates() {
        let cli = Cli::try_parse_from(["sshm", "-vv", "list"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
