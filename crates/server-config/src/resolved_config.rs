/*
 * Cookie Sites
 *
 * Copyright (C) 2024 Fluence DAO
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation version 3 of the
 * License.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::ffi::OsString;
use std::ops::Deref;
use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use clap::{Args, Command, FromArgMatches};
use config::{Config, Environment, File, FileFormat, FileSourceFile};
use eyre::{bail, ensure};
use serde::{Deserialize, Serialize};

use crate::args;
use crate::args::DerivedArgs;
use crate::defaults::{default_time_format, CONFIG_ENV, ENV_PREFIX};
use crate::listen_config::ListenConfig;
use crate::log_config::LogConfig;

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct UnresolvedConfig {
    #[serde(flatten)]
    pub listen_config: ListenConfig,

    /// strftime format of the time rendered on the result page
    #[serde(default = "default_time_format")]
    pub time_format: String,

    pub log: Option<LogConfig>,

    pub no_banner: Option<bool>,

    pub print_config: Option<bool>,
}

impl UnresolvedConfig {
    pub fn resolve(self) -> eyre::Result<ResolvedConfig> {
        validate_time_format(&self.time_format)?;

        let listen = &self.listen_config;
        ensure!(
            listen.counter_port == 0 || listen.counter_port != listen.greeting_port,
            "counter_port and greeting_port must differ, both are set to {}",
            listen.counter_port
        );

        Ok(ResolvedConfig {
            listen_config: self.listen_config,
            time_format: self.time_format,
        })
    }
}

fn validate_time_format(format: &str) -> eyre::Result<()> {
    if format.is_empty() {
        bail!("time_format must not be empty");
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        bail!("time_format {:?} is not a valid strftime format", format);
    }
    Ok(())
}

#[derive(Clone, Debug, Serialize)]
pub struct ResolvedConfig {
    pub listen_config: ListenConfig,
    pub time_format: String,
}

impl Deref for ResolvedConfig {
    type Target = ListenConfig;

    fn deref(&self) -> &Self::Target {
        &self.listen_config
    }
}

pub struct ConfigData {
    pub binary_name: String,
    pub version: String,
    pub authors: String,
    pub description: String,
}

/// Hierarchically loads the configuration using args and envs.
/// The source order is:
///  - Load and parse Config.toml from cwd, if exists
///  - Load and parse files provided by COOKIE_SITES_CONFIG env var
///  - Load and parse files provided by --config arg
///  - Load config values from env vars
///  - Load config values from args
/// On each stage the values override the previous ones.
pub fn load_config(data: Option<ConfigData>) -> eyre::Result<UnresolvedConfig> {
    let raw_args = std::env::args_os().collect::<Vec<_>>();
    load_config_with_args(raw_args, data)
}

pub fn load_config_with_args(
    raw_args: Vec<OsString>,
    data: Option<ConfigData>,
) -> eyre::Result<UnresolvedConfig> {
    let arg_source = process_args(raw_args, data)?;

    let arg_config_sources: Vec<File<FileSourceFile, FileFormat>> = arg_source
        .config
        .iter()
        .flat_map(|paths| {
            paths
                .iter()
                .map(|path| File::from(path.clone()).format(FileFormat::Toml))
                .collect::<Vec<File<FileSourceFile, FileFormat>>>()
        })
        .collect();

    let env_source = Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .prefix_separator("_")
        .separator("__");

    let env_config_sources: Vec<File<FileSourceFile, FileFormat>> = std::env::var_os(CONFIG_ENV)
        .and_then(|str| str.into_string().ok())
        .map(|str| {
            str.trim()
                .split(',')
                .filter(|path| !path.is_empty())
                .map(PathBuf::from)
                .map(|path| File::from(path).format(FileFormat::Toml))
                .collect()
        })
        .unwrap_or_default();

    let mut config_builder = Config::builder().add_source(
        File::with_name("Config.toml")
            .required(false)
            .format(FileFormat::Toml),
    );

    for source in env_config_sources {
        config_builder = config_builder.add_source(source)
    }

    for source in arg_config_sources {
        config_builder = config_builder.add_source(source)
    }
    config_builder = config_builder.add_source(env_source).add_source(arg_source);
    let config = config_builder.build()?;

    let config: UnresolvedConfig = config.try_deserialize()?;

    Ok(config)
}

fn process_args(raw_args: Vec<OsString>, data: Option<ConfigData>) -> eyre::Result<DerivedArgs> {
    let command = Command::new("Cookie sites");
    let command = if let Some(data) = data {
        command
            .version(data.version)
            .author(data.authors)
            .about(data.description)
            .override_usage(format!("{} [FLAGS] [OPTIONS]", data.binary_name))
    } else {
        command
    };

    let raw_cli_config = args::DerivedArgs::augment_args(command);
    let matches = raw_cli_config.get_matches_from(raw_args);
    let arg_source = args::DerivedArgs::from_arg_matches(&matches)?;
    Ok(arg_source)
}
