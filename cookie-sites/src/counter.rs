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

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tower_cookies::{Cookie, Cookies};

use crate::error::HandlerError;
use crate::pages;

pub(crate) const COUNT_COOKIE: &str = "count";

pub(crate) fn routes() -> Router {
    Router::new().route("/", get(handle_counter))
}

async fn handle_counter(
    headers: HeaderMap,
    cookies: Cookies,
) -> Result<Html<String>, HandlerError> {
    let previous = match raw_cookie(&headers, COUNT_COOKIE) {
        Some(value) => parse_count(&value)?,
        None => 0,
    };
    let count = previous
        .checked_add(1)
        .ok_or_else(|| HandlerError::InvalidCookie {
            name: COUNT_COOKIE,
            value: previous.to_string(),
            reason: "count overflow".to_string(),
        })?;
    tracing::debug!(previous, count, "Counted visit");

    cookies.add(
        Cookie::build((COUNT_COOKIE, count.to_string()))
            .path("/")
            .build(),
    );
    Ok(Html(pages::counter_page(count)))
}

/// Value of the cookie `name` exactly as the client sent it, without percent-decoding.
///
/// The decoding cookie jar silently drops values that don't decode to UTF-8 and turns
/// `%31` into `1`, both of which must still fail as non-integers. The last occurrence wins.
fn raw_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .flat_map(|header| {
            String::from_utf8_lossy(header.as_bytes())
                .split(';')
                .filter_map(|pair| {
                    let (key, value) = pair.split_once('=')?;
                    (key.trim() == name).then(|| value.trim().to_string())
                })
                .collect::<Vec<_>>()
        })
        .last()
}

// Surrounding whitespace is accepted, anything else that isn't an integer is an error.
fn parse_count(value: &str) -> Result<i64, HandlerError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|err| HandlerError::InvalidCookie {
            name: COUNT_COOKIE,
            value: value.to_string(),
            reason: err.to_string(),
        })
}
