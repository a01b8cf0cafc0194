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

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

use crate::defaults::{default_counter_port, default_greeting_port, default_listen_ip};

#[derive(Copy, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_listen_ip")]
    pub listen_ip: IpAddr,

    /// Port of the visit counter site
    #[serde(default = "default_counter_port")]
    pub counter_port: u16,

    /// Port of the name and time site
    #[serde(default = "default_greeting_port")]
    pub greeting_port: u16,
}

impl ListenConfig {
    pub fn counter_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_ip, self.counter_port)
    }

    pub fn greeting_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_ip, self.greeting_port)
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            listen_ip: default_listen_ip(),
            counter_port: default_counter_port(),
            greeting_port: default_greeting_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_addrs_share_listen_ip() {
        let config = ListenConfig {
            listen_ip: "127.0.0.1".parse().unwrap(),
            counter_port: 9000,
            greeting_port: 9001,
        };

        assert_eq!(config.counter_addr(), "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.greeting_addr(), "127.0.0.1:9001".parse().unwrap());
    }
}
