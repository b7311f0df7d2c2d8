//! A thin, blocking HTTP layer.
//!
//! Everything above this module talks to an [`HttpClient`], which makes it
//! possible to exercise the site adapters without a network.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use crate::credentials::Credentials;
use crate::errors::RipioError;

pub const USER_AGENT: &str = concat!("ripio/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match *self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

impl From<Method> for reqwest::Method {
    fn from(other: Method) -> reqwest::Method {
        match other {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Form(Vec<(String, String)>),
    Json(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Body,
    pub auth: Option<Credentials>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Request {
        Request {
            method,
            url,
            headers: Vec::new(),
            body: Body::Empty,
            auth: None,
        }
    }

    pub fn get(url: Url) -> Request {
        Request::new(Method::Get, url)
    }

    pub fn header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Request {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn accept(self, media_type: &str) -> Request {
        self.header(ACCEPT.as_str(), media_type)
    }

    pub fn json(mut self, body: Value) -> Request {
        self.body = Body::Json(body);
        self
    }

    pub fn form(mut self, fields: &[(&str, &str)]) -> Request {
        self.body = Body::Form(
            fields
                .iter()
                .map(|&(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn basic_auth(mut self, credentials: Credentials) -> Request {
        self.auth = Some(credentials);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub status: u16,
    /// Header names are lowercase.
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: Vec<u8>) -> Response {
        Response {
            status,
            headers: BTreeMap::new(),
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    pub fn is_json(&self) -> bool {
        self.header(CONTENT_TYPE.as_str())
            .map(|ct| ct.contains("json"))
            .unwrap_or(false)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The `ERROR 404: Not Found` line used at the top of remote error
    /// messages.
    pub fn status_line(&self) -> String {
        let reason = StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown");
        format!("ERROR {}: {}", self.status, reason)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RipioError> {
        serde_json::from_slice(&self.body).map_err(|e| RipioError::RemoteError {
            status: self.status,
            message: format!("unable to deserialize the reply, {}", e),
        })
    }
}

/// Something which can send a request and wait for its reply.
///
/// Only connection level failures are errors, every reply (whatever its
/// status code) is returned as a [`Response`].
pub trait HttpClient {
    fn execute(&self, request: Request) -> Result<Response, RipioError>;
}

/// The real [`HttpClient`], backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::blocking::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<ReqwestClient, RipioError> {
        let inner = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RipioError::NetworkError(e.to_string()))?;

        Ok(ReqwestClient { inner })
    }
}

impl HttpClient for ReqwestClient {
    fn execute(&self, request: Request) -> Result<Response, RipioError> {
        let Request {
            method,
            url,
            headers,
            body,
            auth,
        } = request;
        debug!("Sending {} request to {}", method, url);

        let mut builder = self.inner.request(method.into(), url.clone());

        for (key, value) in &headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        if let Some(creds) = auth {
            trace!("Authenticating as {}", creds.username());
            builder = builder.basic_auth(creds.username(), Some(creds.password()));
        }

        builder = match body {
            Body::Empty => builder,
            Body::Form(fields) => builder.form(&fields),
            Body::Json(value) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(value.to_string()),
        };

        let response = builder
            .send()
            .map_err(|e| RipioError::NetworkError(format!("{} ({})", e, url)))?;

        let status = response.status().as_u16();
        debug!("Received response ({})", status);

        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        if log_enabled!(log::Level::Trace) {
            for line in format!("Response Headers {:#?}", headers).lines() {
                trace!("{}", line);
            }
        }

        let body = response
            .bytes()
            .map_err(|e| RipioError::NetworkError(format!("{} ({})", e, url)))?
            .to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
