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

use server_config::{LogConfig, LogFormat};
use tracing::level_filters::LevelFilter;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

fn env_filter() -> EnvFilter {
    let rust_log = std::env::var("RUST_LOG")
        .unwrap_or_default()
        .replace(char::is_whitespace, "");

    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(rust_log)
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("hyper_util=warn".parse().unwrap())
        .add_directive("mio=error".parse().unwrap())
        .add_directive("tokio_util=error".parse().unwrap())
}

pub fn log_layer<S>(log_config: &Option<LogConfig>) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let log_format = log_config
        .as_ref()
        .map(|c| &c.format)
        .unwrap_or(&LogFormat::Default);

    match log_format {
        LogFormat::Logfmt => tracing_logfmt::builder()
            .with_target(true)
            .with_span_path(false)
            .with_span_name(false)
            .layer()
            .with_filter(env_filter())
            .boxed(),
        LogFormat::Default => tracing_subscriber::fmt::layer()
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_filter(env_filter())
            .boxed(),
    }
}
