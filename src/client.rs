use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, thread};

use log::debug;
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::request::RetrievalRequest;

pub const DEFAULT_API_URL: &str = "https://cds.climate.copernicus.eu/api/v2";

const POLL_INITIAL: Duration = Duration::from_secs(1);
const POLL_MAX: Duration = Duration::from_secs(120);

/// Anything that can run a named dataset retrieval and write the result to
/// `target`, returning the number of bytes written.
pub trait Retrieve {
    fn retrieve(&self, dataset: &str, request: &RetrievalRequest, target: &Path) -> Result<u64>;
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub url: String,
    /// `<uid>:<api-key>`, sent as HTTP basic auth.
    pub key: String,
    pub verify_tls: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            key: String::new(),
            verify_tls: true,
        }
    }
}

impl ClientOptions {
    /// Credentials from `CDSAPI_URL`/`CDSAPI_KEY`, falling back to the
    /// `.cdsapirc` file (`$CDSAPI_RC`, or `$HOME/.cdsapirc`).
    pub fn from_env() -> Result<Self> {
        let mut opts = Self::default();

        let env_url = env::var("CDSAPI_URL").ok();
        let env_key = env::var("CDSAPI_KEY").ok();

        if env_url.is_none() || env_key.is_none() {
            if let Some(rc) = cdsapirc_path() {
                if let Ok(contents) = fs::read_to_string(&rc) {
                    let (url, key) = parse_cdsapirc(&contents);
                    if let Some(url) = url {
                        opts.url = url;
                    }
                    if let Some(key) = key {
                        opts.key = key;
                    }
                }
            }
        }

        if let Some(url) = env_url {
            opts.url = url;
        }
        if let Some(key) = env_key {
            opts.key = key;
        }

        if opts.key.is_empty() {
            return Err(Error::MissingCredentials(
                "set CDSAPI_KEY (and optionally CDSAPI_URL), or provide a ~/.cdsapirc".into(),
            ));
        }

        Ok(opts)
    }
}

fn cdsapirc_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os("CDSAPI_RC") {
        return Some(PathBuf::from(path));
    }
    env::var_os("HOME").map(|home| PathBuf::from(home).join(".cdsapirc"))
}

/// `.cdsapirc` is `url: ...` / `key: ...` lines; unknown lines are ignored.
fn parse_cdsapirc(contents: &str) -> (Option<String>, Option<String>) {
    let mut url = None;
    let mut key = None;
    for line in contents.lines() {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        match name.trim() {
            "url" => url = Some(value.trim().to_string()),
            "key" => key = Some(value.trim().to_string()),
            _ => {}
        }
    }
    (url, key)
}

/// Task state reply from the CDS, both on submission and while polling.
#[derive(Debug, Clone, Deserialize)]
struct TaskReply {
    state: String,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    content_length: Option<u64>,
    #[serde(default)]
    error: Option<TaskErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
struct TaskErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

impl TaskErrorBody {
    fn describe(&self) -> String {
        match (&self.message, &self.reason) {
            (Some(message), Some(reason)) => format!("{message}: {reason}"),
            (Some(message), None) => message.clone(),
            (None, Some(reason)) => reason.clone(),
            (None, None) => "unspecified error".to_string(),
        }
    }
}

/// Blocking client for the CDS task protocol: submit a retrieval, poll it to
/// completion, stream the result to disk.
#[derive(Debug, Clone)]
pub struct CdsClient {
    base: String,
    uid: String,
    secret: String,
    http: HttpClient,
}

impl CdsClient {
    pub fn new(opts: ClientOptions) -> Result<Self> {
        let base = opts.url.trim_end_matches('/').to_string();
        Url::parse(&base)?;

        let (uid, secret) = opts.key.split_once(':').ok_or_else(|| {
            Error::MissingCredentials("API key must look like `<uid>:<api-key>`".into())
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("era5-forcing/0.1"));

        // Retrievals block until the service completes or errors, so no
        // request timeout.
        let mut builder = HttpClient::builder()
            .default_headers(headers)
            .timeout(None::<Duration>);
        if !opts.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build()?;

        Ok(Self {
            base,
            uid: uid.to_string(),
            secret: secret.to_string(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}/{path}", self.base))?)
    }

    /// Download locations may be absolute or relative to the API base.
    fn resolve_location(&self, location: &str) -> Result<Url> {
        if location.contains("://") {
            Ok(Url::parse(location)?)
        } else {
            self.endpoint(location)
        }
    }

    fn submit(&self, dataset: &str, request: &RetrievalRequest) -> Result<TaskReply> {
        let url = self.endpoint(&format!("resources/{dataset}"))?;
        debug!("POST {url}");
        let resp = self
            .http
            .post(url)
            .basic_auth(&self.uid, Some(&self.secret))
            .json(request)
            .send()?;
        reply_from(resp)
    }

    fn poll(&self, request_id: &str) -> Result<TaskReply> {
        let url = self.endpoint(&format!("tasks/{request_id}"))?;
        debug!("GET {url}");
        let resp = self
            .http
            .get(url)
            .basic_auth(&self.uid, Some(&self.secret))
            .send()?;
        reply_from(resp)
    }

    fn fetch(&self, location: &str, target: &Path) -> Result<u64> {
        let url = self.resolve_location(location)?;
        debug!("GET {url}");
        let mut resp = self.http.get(url).send()?.error_for_status()?;
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(target)?;
        Ok(resp.copy_to(&mut file)?)
    }
}

impl Retrieve for CdsClient {
    fn retrieve(&self, dataset: &str, request: &RetrievalRequest, target: &Path) -> Result<u64> {
        let mut reply = self.submit(dataset, request)?;
        let mut wait = POLL_INITIAL;

        loop {
            match reply.state.as_str() {
                "completed" => {
                    if let Some(length) = reply.content_length {
                        debug!("task completed, {length} bytes ready");
                    }
                    let location = reply.location.as_deref().ok_or_else(|| {
                        Error::Retrieval("completed task carries no download location".into())
                    })?;
                    return self.fetch(location, target);
                }
                "failed" => {
                    let detail = reply
                        .error
                        .as_ref()
                        .map(TaskErrorBody::describe)
                        .unwrap_or_else(|| "unspecified error".to_string());
                    return Err(Error::Retrieval(detail));
                }
                "accepted" | "queued" | "running" => {
                    let request_id = reply
                        .request_id
                        .as_deref()
                        .ok_or_else(|| {
                            Error::Retrieval(format!(
                                "{} task carries no request id",
                                reply.state
                            ))
                        })?
                        .to_string();
                    thread::sleep(wait);
                    wait = (wait * 2).min(POLL_MAX);
                    reply = self.poll(&request_id)?;
                }
                other => {
                    return Err(Error::Retrieval(format!("unexpected task state `{other}`")));
                }
            }
        }
    }
}

/// Decode a task reply, surfacing the service's own message on non-2xx.
fn reply_from(resp: Response) -> Result<TaskReply> {
    let status = resp.status();
    if !status.is_success() {
        let detail = resp
            .json::<serde_json::Value>()
            .ok()
            .and_then(|body| body.get("message")?.as_str().map(str::to_string))
            .unwrap_or_else(|| "no detail".to_string());
        return Err(Error::Retrieval(format!("service replied {status}: {detail}")));
    }
    Ok(resp.json()?)
}
