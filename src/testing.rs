//! Test doubles for the network and for git.

use reqwest::Url;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::client::{HttpClient, Request, Response};
use crate::errors::RipioError;
use crate::git::GitTool;

/// An [`HttpClient`] which replies from a fixed table of routes. Anything
/// unknown gets a `404`.
#[derive(Debug, Default)]
pub(crate) struct FakeClient {
    routes: Vec<(String, Result<Response, RipioError>)>,
    requests: RefCell<Vec<Request>>,
}

impl FakeClient {
    pub fn new() -> FakeClient {
        FakeClient::default()
    }

    pub fn on_reply(mut self, method: &str, url: &str, reply: Response) -> FakeClient {
        self.routes.push((route(method, url), Ok(reply)));
        self
    }

    pub fn on_json(self, method: &str, url: &str, status: u16, body: Value) -> FakeClient {
        self.on_reply(method, url, json_reply(status, &body))
    }

    pub fn on_error(mut self, method: &str, url: &str, error: RipioError) -> FakeClient {
        self.routes.push((route(method, url), Err(error)));
        self
    }

    /// Every request made so far, as `METHOD url`.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|r| format!("{} {}", r.method, r.url))
            .collect()
    }

    pub fn last_request(&self) -> Option<Request> {
        self.requests.borrow().last().cloned()
    }
}

impl HttpClient for FakeClient {
    fn execute(&self, request: Request) -> Result<Response, RipioError> {
        let key = format!("{} {}", request.method, request.url);
        self.requests.borrow_mut().push(request);

        self.routes
            .iter()
            .find(|(route, _)| *route == key)
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| {
                Ok(json_reply(
                    404,
                    &serde_json::json!({"message": "Not Found"}),
                ))
            })
    }
}

fn route(method: &str, url: &str) -> String {
    let url = Url::parse(url).expect("test URLs are valid");
    format!("{} {}", method, url)
}

pub(crate) fn json_reply(status: u16, body: &Value) -> Response {
    let mut response = Response::new(status, body.to_string().into_bytes());
    response
        .headers
        .insert("content-type".into(), "application/json".into());
    response
}

/// A [`GitTool`] that remembers what it was asked to do instead of running
/// git.
#[derive(Debug, Default)]
pub(crate) struct FakeGit {
    /// Clone URLs (by prefix) which fail.
    failing: Vec<String>,
    origins: BTreeMap<PathBuf, String>,
    clones: RefCell<Vec<(String, PathBuf)>>,
}

impl FakeGit {
    pub fn new() -> FakeGit {
        FakeGit::default()
    }

    pub fn failing_for(mut self, url_prefix: &str) -> FakeGit {
        self.failing.push(url_prefix.to_string());
        self
    }

    pub fn with_origin<P: Into<PathBuf>>(mut self, working_copy: P, url: &str) -> FakeGit {
        self.origins.insert(working_copy.into(), url.to_string());
        self
    }

    pub fn clones(&self) -> Vec<(String, PathBuf)> {
        self.clones.borrow().clone()
    }
}

impl GitTool for FakeGit {
    fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn FnMut(&str),
    ) -> Result<(), RipioError> {
        self.clones
            .borrow_mut()
            .push((url.to_string(), dest.to_path_buf()));

        if self.failing.iter().any(|prefix| url.starts_with(prefix.as_str())) {
            return Err(RipioError::GitFailed {
                command: "git clone".to_string(),
                message: "Permission denied (publickey).".to_string(),
            });
        }

        progress("Receiving objects: 100%");
        Ok(())
    }

    fn origin_url(&self, working_copy: &Path) -> Result<String, RipioError> {
        self.origins
            .get(working_copy)
            .cloned()
            .ok_or_else(|| RipioError::GitFailed {
                command: "git remote get-url origin".to_string(),
                message: "No such remote 'origin'".to_string(),
            })
    }
}
