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

use clap::Parser;
use owo_colors::OwoColorize;
use std::process::ExitCode;

use sshm::cli::{Cli, Command};
use sshm::commands;
use sshm::config::Config;
use sshm::registry::{Registry, RegistryError};
use sshm::utils::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<ExitCode> {
    // The secret helper works without a registry.
    if let Command::Encrypt { password } = &cli.command {
        commands::encrypt::encrypt_password(password);
        return Ok(ExitCode::SUCCESS);
    }

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut registry = match Registry::load(&config_path).await {
        Ok(registry) => registry,
        Err(e) => return Ok(report_fatal(e)),
    };

    match cli.command {
        Command::List => commands::list::list_servers(&registry),
        Command::Login { server } => commands::login::login(&registry, &server).await?,
        Command::Run {
            server,
            commands: cmds,
        } => {
            let code = commands::run::run_commands(&registry, &server, &cmds).await?;
            return Ok(ExitCode::from(code as u8));
        }
        Command::Cp { source, dest } => commands::cp::copy(&registry, &source, &dest).await?,
        Command::Add { group } => commands::manage::add(&mut registry, group.as_deref()).await?,
        Command::Edit { flag } => commands::manage::edit(&mut registry, &flag).await?,
        Command::Remove { flag } => commands::manage::remove(&mut registry, &flag).await?,
        Command::Encrypt { .. } => unreachable!("handled above"),
    }

    Ok(ExitCode::SUCCESS)
}

/// A registry that failed to load cannot be worked around; the address
/// space it would have provided is not trustworthy.
fn report_fatal(e: RegistryError) -> ExitCode {
    match e {
        RegistryError::Config(_) | RegistryError::DuplicateFlag(_) => {
            eprintln!("{} {e}", "fatal:".red().bold());
        }
        _ => eprintln!("{} {e}", "Error:".red().bold()),
    }
    ExitCode::from(2)
}
