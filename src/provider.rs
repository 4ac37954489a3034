use std::error::Error as _;

use log::debug;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::GlanceError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// What a provider answered, once transport errors and non-404 failures are ruled out.
#[derive(Debug)]
pub enum Reply {
    Body(String),
    NotFound,
}

pub fn build_http_client() -> anyhow::Result<Client> {
    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// One GET against a provider. 404 is returned as a value so each client can name
/// the thing that was not found.
pub async fn get(
    http: &Client,
    url: &Url,
    query: &[(&str, &str)],
    what: &'static str,
) -> Result<Reply, GlanceError> {
    let res = http
        .get(url.clone())
        .query(query)
        .send()
        .await
        .map_err(|e| transport_error(what, e))?;

    let status = res.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(Reply::NotFound);
    }

    let body = res
        .text()
        .await
        .map_err(|e| transport_error(what, e))?;

    if !status.is_success() {
        return Err(GlanceError::Upstream {
            what,
            detail: format!("{status}: {}", truncate_body(&body)),
        });
    }

    Ok(Reply::Body(body))
}

// reqwest errors print the request URL, and the URL carries the API key.
fn transport_error(what: &'static str, e: reqwest::Error) -> GlanceError {
    let e = e.without_url();
    let detail = match e.source() {
        Some(cause) => format!("{e}: {cause}"),
        None => e.to_string(),
    };
    GlanceError::Upstream { what, detail }
}

pub fn parse_json<T: DeserializeOwned>(body: &str, what: &'static str) -> Result<T, GlanceError> {
    let de = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(de).map_err(|e| {
        let detail = format!("at `{}`: {}", e.path(), e.inner());
        debug!("Invalid {what} JSON {detail}");
        GlanceError::Parse { what, detail }
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
