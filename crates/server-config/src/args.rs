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

use clap::Parser;
use config::{ConfigError, Map, Source, Value};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
pub(crate) struct DerivedArgs {
    #[arg(
        short('i'),
        long,
        id = "LISTEN_IP",
        help = "ip address both sites listen on",
        value_name = "IP",
        help_heading = "Networking",
        display_order = 1
    )]
    listen_ip: Option<IpAddr>,
    #[arg(
        short('c'),
        long,
        id = "COUNTER_PORT",
        help = "visit counter site port",
        help_heading = "Networking",
        display_order = 2
    )]
    counter_port: Option<u16>,
    #[arg(
        short('g'),
        long,
        id = "GREETING_PORT",
        help = "name and time site port",
        help_heading = "Networking",
        display_order = 3
    )]
    greeting_port: Option<u16>,

    #[arg(
        short('t'),
        long,
        id = "TIME_FORMAT",
        help = "strftime format of the time shown on the result page",
        value_name = "FORMAT",
        help_heading = "Sites",
        display_order = 4
    )]
    time_format: Option<String>,

    #[arg(
        long,
        value_parser(["default", "logfmt"]),
        id = "LOG_FORMAT",
        help = "log output format",
        help_heading = "Logging",
        display_order = 5
    )]
    log_format: Option<String>,

    #[arg(
        short('f'),
        long,
        id = "CONFIG_FILE",
        help_heading = "Configuration",
        help = "TOML configuration file",
        value_name = "PATH",
        display_order = 6,
        action = clap::ArgAction::Append
    )]
    pub(crate) config: Option<Vec<PathBuf>>,
    #[arg(
        long,
        value_parser = clap::value_parser!(bool),
        id = "NO_BANNER",
        help = "Do not print the greeting banner",
        help_heading = "Configuration",
        display_order = 7,
        action = clap::ArgAction::SetTrue
    )]
    no_banner: Option<bool>,
    #[arg(
        long,
        value_parser = clap::value_parser!(bool),
        id = "PRINT_CONFIG",
        help = "Print applied config",
        help_heading = "Configuration",
        display_order = 8,
        action = clap::ArgAction::SetTrue
    )]
    print_config: Option<bool>,
}

// Absent flags are skipped so that they don't shadow values from files and env.
// SetTrue flags are always present, so only an explicit `true` is forwarded.
impl Serialize for DerivedArgs {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut struct_serializer = serializer.serialize_struct("DerivedArgs", 7)?;

        if let Some(listen_ip) = &self.listen_ip {
            struct_serializer.serialize_field("listen_ip", listen_ip)?;
        }
        if let Some(counter_port) = &self.counter_port {
            struct_serializer.serialize_field("counter_port", counter_port)?;
        }
        if let Some(greeting_port) = &self.greeting_port {
            struct_serializer.serialize_field("greeting_port", greeting_port)?;
        }
        if let Some(time_format) = &self.time_format {
            struct_serializer.serialize_field("time_format", time_format)?;
        }
        if let Some(true) = self.no_banner {
            struct_serializer.serialize_field("no_banner", &true)?;
        }
        if let Some(true) = self.print_config {
            struct_serializer.serialize_field("print_config", &true)?;
        }
        if let Some(format) = &self.log_format {
            let log = BTreeMap::from([("format", format)]);
            struct_serializer.serialize_field("log", &log)?;
        }
        struct_serializer.end()
    }
}

impl Source for DerivedArgs {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new((*self).clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        let source_str =
            toml::to_string(&self).map_err(|e| ConfigError::Foreign(Box::new(e)))?;
        let result: Map<String, Value> =
            toml::de::from_str(&source_str).map_err(|e| ConfigError::Foreign(Box::new(e)))?;

        Ok(result)
    }
}
