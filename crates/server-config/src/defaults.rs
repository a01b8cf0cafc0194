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

use std::net::{IpAddr, Ipv4Addr};

/// Prefix of the environment variables read by [`crate::load_config`].
pub const ENV_PREFIX: &str = "COOKIE_SITES";

/// Comma-separated list of TOML files to load before command line configs.
pub const CONFIG_ENV: &str = "COOKIE_SITES_CONFIG";

pub fn default_listen_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

pub fn default_counter_port() -> u16 {
    8000
}

pub fn default_greeting_port() -> u16 {
    8001
}

pub fn default_time_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}
