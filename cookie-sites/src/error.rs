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

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failures of a single request.
///
/// The client only ever sees a generic 500, the details go to the log.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("required query parameter '{key}' is missing")]
    MissingQueryParam { key: &'static str },
    #[error("cookie '{name}' has invalid value {value:?}: {reason}")]
    InvalidCookie {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("time format {format:?} could not be applied")]
    TimeFormat { format: String },
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
