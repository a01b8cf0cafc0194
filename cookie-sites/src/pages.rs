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

//! HTML pages of both sites.
//!
//! Every user supplied value goes through [`escape`] before it lands in the markup.

use std::borrow::Cow;

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
{body}
</body>
</html>
"#
    )
}

pub(crate) fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 16);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

pub(crate) fn counter_page(count: i64) -> String {
    layout(
        "Visit counter",
        &format!(r#"<h1>You have visited this page <span id="count">{count}</span> time(s)</h1>"#),
    )
}

pub(crate) fn form_page(submit_path: &str) -> String {
    let body = format!(
        r#"<h1>Tell us your name</h1>
<form method="get" action="{}">
<label for="id_name">Name:</label>
<input type="text" name="name" id="id_name" required>
<button type="submit">Submit</button>
</form>"#,
        escape(submit_path)
    );
    layout("Name form", &body)
}

pub(crate) fn confirmation_page(name: &str, result_path: &str) -> String {
    let body = format!(
        r#"<h1>Hello, <span id="name">{}</span></h1>
<p>Your name has been saved.</p>
<a href="{}">Show my name and the current time</a>"#,
        escape(name),
        escape(result_path)
    );
    layout("Name saved", &body)
}

pub(crate) fn result_page(name: Option<&str>, time: &str) -> String {
    let body = format!(
        r#"<h1>Hello, <span id="name">{}</span></h1>
<p>Current server time: <span id="time">{}</span></p>"#,
        escape(name.unwrap_or_default()),
        escape(time)
    );
    layout("Name and time", &body)
}
