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
use axum::response::IntoResponse;
use axum::Router;
use eyre::{eyre, WrapErr};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::{counter, greeting};

async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "No such endpoint")
}

#[derive(Clone)]
pub(crate) struct RouteState(pub(crate) Arc<Inner>);

pub(crate) struct Inner {
    pub(crate) time_format: String,
}

/// One of the two independent sites; each one gets its own listener.
#[derive(Debug, Clone)]
pub enum Site {
    /// Visit counter kept in the `count` cookie
    Counter,
    /// Name form, name submission and the name/time result page
    Greeting { time_format: String },
}

impl Site {
    pub fn name(&self) -> &'static str {
        match self {
            Site::Counter => "counter",
            Site::Greeting { .. } => "greeting",
        }
    }

    fn routes(self) -> Router {
        match self {
            Site::Counter => counter::routes(),
            Site::Greeting { time_format } => {
                greeting::routes(RouteState(Arc::new(Inner { time_format })))
            }
        }
    }
}

#[derive(Debug)]
pub struct StartedHttp {
    pub listen_addr: SocketAddr,
}

/// Serves `site` on `listen_addr` until `exit` fires or its sender is dropped.
///
/// The actually bound address is reported through `notify` once the listener is up.
pub async fn start_http_endpoint(
    listen_addr: SocketAddr,
    site: Site,
    notify: oneshot::Sender<StartedHttp>,
    exit: oneshot::Receiver<()>,
) -> eyre::Result<()> {
    let name = site.name();
    let app: Router = site
        .routes()
        .fallback(handler_404)
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(listen_addr)
        .await
        .wrap_err_with(|| format!("Could not bind {name} site to {listen_addr}"))?;
    notify
        .send(StartedHttp {
            listen_addr: listener.local_addr()?,
        })
        .map_err(|_| eyre!("Could not send http info"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = exit.await;
        })
        .await
        .wrap_err("Could not make http endpoint")?;

    tracing::info!(site = name, "Http endpoint stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages;
    use reqwest::header::{COOKIE, SET_COOKIE};
    use tokio::task::JoinHandle;

    struct TestSite {
        addr: SocketAddr,
        exit_outlet: oneshot::Sender<()>,
        handle: JoinHandle<eyre::Result<()>>,
    }

    impl TestSite {
        fn url(&self, path: &str) -> String {
            format!("http://{}{}", self.addr, path)
        }
    }

    async fn start_site(site: Site) -> TestSite {
        let addr = "127.0.0.1:0".parse::<SocketAddr>().unwrap();

        let (notify_sender, notify_receiver) = oneshot::channel();
        let (exit_outlet, exit_inlet) = oneshot::channel();
        let handle = tokio::spawn(start_http_endpoint(
            addr,
            site,
            notify_sender,
            exit_inlet,
        ));

        let http_info = notify_receiver.await.unwrap();
        TestSite {
            addr: http_info.listen_addr,
            exit_outlet,
            handle,
        }
    }

    fn greeting(time_format: &str) -> Site {
        Site::Greeting {
            time_format: time_format.to_string(),
        }
    }

    fn set_cookies(response: &reqwest::Response) -> Vec<String> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_counter_route_without_cookie() {
        let site = start_site(Site::Counter).await;
        let client = reqwest::Client::new();

        let response = client.get(site.url("/")).send().await.unwrap();
        let status = response.status();
        let cookies = set_cookies(&response);
        let body = response.text().await.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cookies, vec!["count=1; Path=/".to_string()]);
        assert!(body.contains(r#"<span id="count">1</span>"#), "{body}");
    }

    #[tokio::test]
    async fn test_counter_route_increments_cookie() {
        let site = start_site(Site::Counter).await;
        let client = reqwest::Client::new();

        let response = client
            .get(site.url("/"))
            .header(COOKIE, "count=41")
            .send()
            .await
            .unwrap();
        let status = response.status();
        let cookies = set_cookies(&response);
        let body = response.text().await.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cookies, vec!["count=42; Path=/".to_string()]);
        assert!(body.contains(r#"<span id="count">42</span>"#), "{body}");
    }

    #[tokio::test]
    async fn test_counter_route_follows_returned_cookie() {
        let site = start_site(Site::Counter).await;
        let client = reqwest::Client::new();

        let mut cookie: Option<String> = None;
        for expected in 1..=3 {
            let mut request = client.get(site.url("/"));
            if let Some(cookie) = &cookie {
                request = request.header(COOKIE, cookie);
            }
            let response = request.send().await.unwrap();
            let set_cookie = set_cookies(&response).pop().unwrap();
            let body = response.text().await.unwrap();

            assert!(body.contains(&format!(r#"<span id="count">{expected}</span>"#)));
            cookie = set_cookie.split(';').next().map(str::to_string);
        }
        assert_eq!(cookie.as_deref(), Some("count=3"));
    }

    #[tokio::test]
    async fn test_counter_route_invalid_cookie() {
        let site = start_site(Site::Counter).await;
        let client = reqwest::Client::new();

        let response = client
            .get(site.url("/"))
            .header(COOKIE, "count=abc")
            .send()
            .await
            .unwrap();
        let status = response.status();
        let cookies = set_cookies(&response);
        let body = response.text().await.unwrap();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(cookies.is_empty());
        assert!(!body.contains("abc"));
    }

    #[tokio::test]
    async fn test_counter_route_undecoded_cookie() {
        let site = start_site(Site::Counter).await;
        let client = reqwest::Client::new();

        for cookie in ["count=%ff", "count=%31"] {
            let response = client
                .get(site.url("/"))
                .header(COOKIE, cookie)
                .send()
                .await
                .unwrap();
            let status = response.status();
            let cookies = set_cookies(&response);

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{cookie}");
            assert!(cookies.is_empty(), "{cookie}: {cookies:?}");
        }
    }

    #[tokio::test]
    async fn test_counter_route_overflow() {
        let site = start_site(Site::Counter).await;
        let client = reqwest::Client::new();

        let response = client
            .get(site.url("/"))
            .header(COOKIE, format!("count={}", i64::MAX))
            .send()
            .await
            .unwrap();
        let status = response.status();
        let cookies = set_cookies(&response);

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(cookies.is_empty(), "{cookies:?}");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let site = start_site(Site::Counter).await;
        let client = reqwest::Client::new();

        let response = client.get(site.url("/result")).send().await.unwrap();
        let status = response.status();
        let body = response.bytes().await.unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(&body[..], b"No such endpoint");
    }

    #[tokio::test]
    async fn test_form_route() {
        let site = start_site(greeting("%H:%M")).await;
        let client = reqwest::Client::new();

        let response = client.get(site.url("/")).send().await.unwrap();
        let status = response.status();
        let cookies = set_cookies(&response);
        let body = response.text().await.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert!(cookies.is_empty());
        assert!(body.contains(r#"action="/gettime""#), "{body}");
        assert!(body.contains(r#"<input type="text" name="name""#), "{body}");
    }

    #[tokio::test]
    async fn test_submit_route_sets_name_cookie() {
        let site = start_site(greeting("%H:%M")).await;
        let client = reqwest::Client::new();

        let response = client
            .get(site.url("/gettime"))
            .query(&[("name", "Alice")])
            .send()
            .await
            .unwrap();
        let status = response.status();
        let cookies = set_cookies(&response);
        let body = response.text().await.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cookies, vec!["name=Alice; Path=/".to_string()]);
        assert!(body.contains(r#"<span id="name">Alice</span>"#), "{body}");
        assert!(body.contains(r#"href="/result""#), "{body}");
    }

    #[tokio::test]
    async fn test_submit_route_without_name() {
        let site = start_site(greeting("%H:%M")).await;
        let client = reqwest::Client::new();

        let response = client.get(site.url("/gettime")).send().await.unwrap();
        let status = response.status();
        let cookies = set_cookies(&response);

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(cookies.is_empty());
    }

    #[tokio::test]
    async fn test_submit_route_repeated_name() {
        let site = start_site(greeting("%H:%M")).await;
        let client = reqwest::Client::new();

        let response = client
            .get(site.url("/gettime?name=a&name=b"))
            .send()
            .await
            .unwrap();
        let status = response.status();
        let cookies = set_cookies(&response);
        let body = response.text().await.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cookies, vec!["name=b; Path=/".to_string()]);
        assert!(body.contains(r#"<span id="name">b</span>"#), "{body}");
    }

    #[tokio::test]
    async fn test_submit_route_encodes_cookie_value() {
        let site = start_site(greeting("%H:%M")).await;
        let client = reqwest::Client::new();

        let response = client
            .get(site.url("/gettime"))
            .query(&[("name", "Bob; x=1")])
            .send()
            .await
            .unwrap();
        let cookies = set_cookies(&response);

        assert_eq!(cookies, vec!["name=Bob%3B%20x%3D1; Path=/".to_string()]);
    }

    #[tokio::test]
    async fn test_submit_route_escapes_name() {
        let site = start_site(greeting("%H:%M")).await;
        let client = reqwest::Client::new();

        let response = client
            .get(site.url("/gettime"))
            .query(&[("name", "<b>Bob</b>")])
            .send()
            .await
            .unwrap();
        let status = response.status();
        let body = response.text().await.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("&lt;b&gt;Bob&lt;/b&gt;"), "{body}");
        assert!(!body.contains("<b>Bob"), "{body}");
    }

    #[tokio::test]
    async fn test_result_route_with_name_cookie() {
        let site = start_site(greeting("stamp %Y")).await;
        let client = reqwest::Client::new();

        let response = client
            .get(site.url("/result"))
            .header(COOKIE, "name=Alice")
            .send()
            .await
            .unwrap();
        let status = response.status();
        let cookies = set_cookies(&response);
        let body = response.text().await.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert!(cookies.is_empty());
        assert!(body.contains(r#"<span id="name">Alice</span>"#), "{body}");
        assert!(body.contains(r#"<span id="time">stamp "#), "{body}");
    }

    #[tokio::test]
    async fn test_result_route_without_name_cookie() {
        let site = start_site(greeting("stamp %Y")).await;
        let client = reqwest::Client::new();

        let response = client.get(site.url("/result")).send().await.unwrap();
        let status = response.status();
        let body = response.text().await.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"<span id="name"></span>"#), "{body}");
        assert!(body.contains(r#"<span id="time">stamp "#), "{body}");
    }

    #[tokio::test]
    async fn test_submitted_name_reaches_result() {
        let site = start_site(greeting("%H:%M:%S")).await;
        let client = reqwest::Client::new();

        let response = client
            .get(site.url("/gettime"))
            .query(&[("name", "Alice")])
            .send()
            .await
            .unwrap();
        let set_cookie = set_cookies(&response).pop().unwrap();
        let cookie = set_cookie.split(';').next().unwrap().to_string();

        let response = client
            .get(site.url("/result"))
            .header(COOKIE, cookie)
            .send()
            .await
            .unwrap();
        let body = response.text().await.unwrap();
        assert!(body.contains(r#"<span id="name">Alice</span>"#), "{body}");
    }

    #[tokio::test]
    async fn test_special_names_reach_result_unchanged() {
        let site = start_site(greeting("%H:%M:%S")).await;
        let client = reqwest::Client::new();

        for name in ["Bob; x=1", "J\u{fc}rgen", "100% \"sure\", ok"] {
            let response = client
                .get(site.url("/gettime"))
                .query(&[("name", name)])
                .send()
                .await
                .unwrap();
            let cookies = set_cookies(&response);
            assert_eq!(cookies.len(), 1, "{name}: {cookies:?}");
            let cookie = cookies[0].split(';').next().unwrap().to_string();

            let response = client
                .get(site.url("/result"))
                .header(COOKIE, cookie)
                .send()
                .await
                .unwrap();
            let body = response.text().await.unwrap();

            let expected = format!(r#"<span id="name">{}</span>"#, pages::escape(name));
            assert!(body.contains(&expected), "{name}: {body}");
        }
    }

    #[tokio::test]
    async fn test_exit_stops_endpoint() {
        let site = start_site(Site::Counter).await;

        site.exit_outlet.send(()).unwrap();
        site.handle.await.unwrap().unwrap();
    }
}
