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

#![warn(rust_2018_idioms)]

use std::net::SocketAddr;

use eyre::{eyre, WrapErr};
use tokio::signal;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cookie_sites::{log_layer, start_http_endpoint, Site};
use server_config::{load_config, ConfigData, ResolvedConfig};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
const PKG_NAME: &str = env!("CARGO_PKG_NAME");

fn main() -> eyre::Result<()> {
    let config_data = ConfigData {
        binary_name: PKG_NAME.to_string(),
        version: VERSION.to_string(),
        authors: format!("by {AUTHORS}"),
        description: DESCRIPTION.to_string(),
    };
    let config = load_config(Some(config_data))?;

    match config.no_banner {
        Some(true) => {}
        _ => {
            println!(
                r#"
+-------------------------------------------------+
| Cookie sites: a visit counter and a name/time   |
| page, both keeping their state in your browser. |
+-------------------------------------------------+
    "#
            )
        }
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("tokio")
        .build()
        .wrap_err("Could not make tokio runtime")?
        .block_on(async move {
            tracing_subscriber::registry()
                .with(log_layer(&config.log))
                .init();

            if let Some(true) = config.print_config {
                log::info!("Loaded config: {:#?}", config);
            }

            let config = config.resolve()?;

            let mut sites = start_sites(config).await?;
            log::info!("Cookie sites have been successfully started.");
            log::info!("Waiting for Ctrl-C to exit...");

            let failed = tokio::select! {
                stop = signal::ctrl_c() => {
                    stop.wrap_err("Failed to listen for Ctrl-C")?;
                    None
                },
                err = sites.next_exit() => Some(err),
            };

            match failed {
                None => {
                    log::info!("Shutting down...");
                    sites.stop().await
                }
                Some(err) => {
                    log::error!("Shutting down after a site failure: {:?}", err);
                    let _ = sites.stop().await;
                    Err(err)
                }
            }
        })
}

type SiteTask = (&'static str, eyre::Result<()>);

/// Running sites: an exit outlet per site and the tasks serving them.
#[derive(Default)]
struct Sites {
    exit_outlets: Vec<(&'static str, oneshot::Sender<()>)>,
    tasks: JoinSet<SiteTask>,
}

impl Sites {
    async fn start_site(&mut self, listen_addr: SocketAddr, site: Site) -> eyre::Result<()> {
        let name = site.name();
        let (notify, started) = oneshot::channel();
        let (exit_outlet, exit_inlet) = oneshot::channel();
        self.tasks.spawn(async move {
            (
                name,
                start_http_endpoint(listen_addr, site, notify, exit_inlet).await,
            )
        });

        match started.await {
            Ok(started) => {
                log::info!("{} site listens on http://{}", name, started.listen_addr);
                self.exit_outlets.push((name, exit_outlet));
                Ok(())
            }
            Err(_) => Err(self
                .next_exit()
                .await
                .wrap_err(format!("{name} site stopped before it started"))),
        }
    }

    /// Waits for the first site task to finish. Pending forever when no sites run.
    ///
    /// Sites only finish on their own when something went wrong, so every exit is an error.
    async fn next_exit(&mut self) -> eyre::Report {
        match self.tasks.join_next().await {
            Some(Ok((name, Ok(())))) => eyre!("{name} site stopped unexpectedly"),
            Some(Ok((name, Err(err)))) => err.wrap_err(format!("{name} site failed")),
            Some(Err(err)) => eyre::Report::new(err).wrap_err("site task failed"),
            None => std::future::pending().await,
        }
    }

    async fn stop(mut self) -> eyre::Result<()> {
        for (name, exit_outlet) in self.exit_outlets.drain(..) {
            log::trace!("Stopping {} site", name);
            // the endpoint may already be gone, in which case its error surfaces below
            let _ = exit_outlet.send(());
        }

        let mut result = Ok(());
        while let Some(joined) = self.tasks.join_next().await {
            let stopped = joined
                .wrap_err("site task failed")
                .and_then(|(name, r)| r.wrap_err_with(|| format!("{name} site failed")));
            if let Err(err) = stopped {
                log::error!("{:?}", err);
                result = Err(err);
            }
        }
        result
    }
}

async fn start_sites(config: ResolvedConfig) -> eyre::Result<Sites> {
    let mut sites = Sites::default();
    let started = async {
        sites.start_site(config.counter_addr(), Site::Counter).await?;
        sites
            .start_site(
                config.greeting_addr(),
                Site::Greeting {
                    time_format: config.time_format.clone(),
                },
            )
            .await
    }
    .await;

    match started {
        Ok(()) => Ok(sites),
        Err(err) => {
            // don't leave a site running without its sibling
            let _ = sites.stop().await;
            Err(err)
        }
    }
}
