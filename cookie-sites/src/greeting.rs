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

use std::fmt::Write;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use chrono::Local;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tower_cookies::{Cookie, Cookies};

use crate::error::HandlerError;
use crate::http::RouteState;
use crate::pages;

pub(crate) const NAME_COOKIE: &str = "name";
pub(crate) const NAME_PARAM: &str = "name";
pub(crate) const SUBMIT_PATH: &str = "/gettime";
pub(crate) const RESULT_PATH: &str = "/result";

/// Bytes that can't appear raw in a cookie value. `%` is included so that the
/// decoding done when the cookie is read back restores the exact value.
const COOKIE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b',')
    .add(b';')
    .add(b'=')
    .add(b'\\');

pub(crate) fn routes(state: RouteState) -> Router {
    Router::new()
        .route("/", get(handle_form))
        .route(SUBMIT_PATH, get(handle_submit))
        .route(RESULT_PATH, get(handle_result))
        .with_state(state)
}

async fn handle_form() -> Html<String> {
    Html(pages::form_page(SUBMIT_PATH))
}

async fn handle_submit(
    cookies: Cookies,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Html<String>, HandlerError> {
    let name = last_param(query, NAME_PARAM)
        .ok_or(HandlerError::MissingQueryParam { key: NAME_PARAM })?;
    tracing::debug!(name = %name, "Saving name");

    let page = pages::confirmation_page(&name, RESULT_PATH);
    let value = utf8_percent_encode(&name, COOKIE_VALUE).to_string();
    cookies.add(Cookie::build((NAME_COOKIE, value)).path("/").build());
    Ok(Html(page))
}

/// A repeated query key resolves to its last value.
fn last_param(query: Vec<(String, String)>, key: &str) -> Option<String> {
    query
        .into_iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, value)| value)
}

async fn handle_result(
    State(state): State<RouteState>,
    cookies: Cookies,
) -> Result<Html<String>, HandlerError> {
    let name = cookies.get(NAME_COOKIE);
    let time = local_time(&state.0.time_format)?;

    Ok(Html(pages::result_page(
        name.as_ref().map(|cookie| cookie.value()),
        &time,
    )))
}

/// Current local time rendered with a strftime `format`.
fn local_time(format: &str) -> Result<String, HandlerError> {
    let mut time = String::new();
    // chrono reports unknown specifiers only while writing
    write!(time, "{}", Local::now().format(format)).map_err(|_| HandlerError::TimeFormat {
        format: format.to_string(),
    })?;
    Ok(time)
}
