use reqwest::Url;
use serde_json::{json, Value};
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use super::{
    check_reply, parse_url, remote_error, says_already_exists, Access, CommitInfo, Page,
    RepositoryMetadata, RepositorySummary, SiteAdapter,
};
use crate::client::{HttpClient, Method, Request, Response};
use crate::credentials::Authenticator;
use crate::errors::RipioError;
use crate::names::{RepoReference, WorkspaceName};
use crate::site::Site;

const API_ROOT: &str = "https://api.bitbucket.org/2.0/repositories";
const MEDIA_TYPE: &str = "application/json";

/// Bitbucket Cloud, through its 2.0 REST API.
#[derive(Clone)]
pub struct Bitbucket {
    client: Rc<dyn HttpClient>,
    auth: Authenticator,
}

impl Bitbucket {
    pub fn new(client: Rc<dyn HttpClient>, auth: Authenticator) -> Bitbucket {
        Bitbucket { client, auth }
    }

    fn repo_url(&self, reference: &RepoReference) -> Result<Url, RipioError> {
        parse_url(&format!(
            "{}/{}/{}",
            API_ROOT,
            reference.workspace(),
            reference.slug
        ))
    }

    fn send(&self, request: Request) -> Result<Response, RipioError> {
        self.client
            .execute(self.auth.authenticate(request.accept(MEDIA_TYPE)))
    }

    fn classify(&self, subject: &str, response: &Response) -> RipioError {
        match response.status {
            401 | 403 => RipioError::AccessDenied(subject.to_string()),
            404 => RipioError::RepositoryNotFound(subject.to_string()),
            429 => RipioError::RateLimitExceeded(subject.to_string()),
            _ => remote_error(response, error_details),
        }
    }
}

impl SiteAdapter for Bitbucket {
    fn site(&self) -> Site {
        Site::Bitbucket
    }

    fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    fn first_page(&self, workspace: &WorkspaceName) -> Result<Url, RipioError> {
        parse_url(&format!("{}/{}?sort=slug", API_ROOT, workspace.workspace))
    }

    fn fetch_page(&self, workspace: &WorkspaceName, url: &Url) -> Result<Page, RipioError> {
        let subject = workspace.to_string();
        let response = self.send(Request::get(url.clone()))?;
        let response = check_reply(response, &[200], |r| self.classify(&subject, r))?;

        let raw: RawPage = response.json()?;
        let next = match raw.next {
            Some(ref next) => Some(parse_url(next)?),
            None => None,
        };
        let repositories = raw
            .values
            .into_iter()
            .map(RawRepo::into_summary)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page { next, repositories })
    }

    fn fetch(&self, reference: &RepoReference) -> Result<RepositoryMetadata, RipioError> {
        let subject = reference.global_name();
        let response = self.send(Request::get(self.repo_url(reference)?))?;
        let response = check_reply(response, &[200], |r| self.classify(&subject, r))?;

        let raw: Value = response.json()?;
        let repo: RawRepo = serde_json::from_value(raw.clone()).map_err(|e| {
            RipioError::RemoteError {
                status: response.status,
                message: format!("unable to deserialize the reply, {}", e),
            }
        })?;

        Ok(repo.into_metadata(raw))
    }

    fn create(&self, reference: &RepoReference, private: bool) -> Result<String, RipioError> {
        let subject = reference.global_name();
        let request = Request::new(Method::Post, self.repo_url(reference)?)
            .json(json!({"scm": "git", "is_private": private}));

        let response = self.send(request)?;
        let response = check_reply(response, &[200, 201], |r| {
            if r.status == 400 && says_already_exists(r) {
                RipioError::AlreadyExists(subject.clone())
            } else {
                self.classify(&subject, r)
            }
        })?;

        let created: RawRepo = response.json().unwrap_or_default();
        if created.slug.is_empty() {
            Ok(reference.slug.clone())
        } else {
            Ok(created.slug)
        }
    }

    fn rename(&self, reference: &RepoReference, new_slug: &str) -> Result<String, RipioError> {
        let subject = reference.global_name();
        let request =
            Request::new(Method::Put, self.repo_url(reference)?).form(&[("name", new_slug)]);

        let response = self.send(request)?;
        let response = check_reply(response, &[200], |r| self.classify(&subject, r))?;

        let from_location = response
            .header("location")
            .and_then(|location| location.trim_end_matches('/').rsplit('/').next())
            .filter(|slug| !slug.is_empty())
            .map(|slug| slug.to_string());

        match from_location {
            Some(slug) => Ok(slug),
            None => {
                let renamed: RawRepo = response.json()?;
                Ok(renamed.slug)
            }
        }
    }

    fn delete(&self, reference: &RepoReference) -> Result<(), RipioError> {
        let subject = reference.global_name();
        let response = self.send(Request::new(Method::Delete, self.repo_url(reference)?))?;
        check_reply(response, &[204], |r| self.classify(&subject, r))?;

        Ok(())
    }

    fn commits(
        &self,
        reference: &RepoReference,
        limit: usize,
    ) -> Result<Vec<CommitInfo>, RipioError> {
        let subject = reference.global_name();
        let url = parse_url(&format!(
            "{}/commits?pagelen={}",
            self.repo_url(reference)?,
            limit
        ))?;

        let response = self.send(Request::get(url))?;
        let response = check_reply(response, &[200], |r| self.classify(&subject, r))?;
        let page: RawCommitPage = response.json()?;

        Ok(page
            .values
            .into_iter()
            .take(limit)
            .map(|c| CommitInfo {
                hash: c.hash,
                author: c.author.raw,
                date: c.date,
                message: c.message,
            })
            .collect())
    }
}

impl Debug for Bitbucket {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Bitbucket")
            .field("auth", &self.auth)
            .finish()
    }
}

/// Bitbucket nests its explanations as `{"error": {"message", "detail"}}`.
fn error_details(body: &Value) -> Vec<String> {
    let error = &body["error"];
    let mut lines = Vec::new();

    if let Some(message) = error["message"].as_str() {
        lines.push(message.to_string());
    }

    match error.get("detail") {
        Some(Value::String(detail)) => lines.push(detail.clone()),
        Some(Value::Null) | None => {}
        Some(detail) => {
            lines.push(serde_json::to_string_pretty(detail).unwrap_or_else(|_| detail.to_string()))
        }
    }

    lines
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawRepo {
    scm: String,
    slug: String,
    full_name: String,
    size: u64,
    is_private: bool,
    links: RawLinks,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawLinks {
    clone: Vec<RawLink>,
    html: RawHref,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawLink {
    name: String,
    href: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawHref {
    href: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawPage {
    values: Vec<RawRepo>,
    next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawCommitPage {
    values: Vec<RawCommit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawCommit {
    hash: String,
    author: RawAuthor,
    date: String,
    message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawAuthor {
    raw: String,
}

impl RawRepo {
    fn into_summary(self) -> Result<RepositorySummary, RipioError> {
        // `full_name` is "workspace/slug", but the slug field is canonical
        let workspace = self.full_name.split('/').next().unwrap_or_default();
        let reference = RepoReference::from_parts(workspace, &self.slug, Some(Site::Bitbucket))?;

        Ok(RepositorySummary {
            reference,
            scm: self.scm,
            size: self.size,
            access: Access::from_private(self.is_private),
        })
    }

    fn into_metadata(self, raw: Value) -> RepositoryMetadata {
        RepositoryMetadata {
            clone_links: self
                .links
                .clone
                .into_iter()
                .map(|link| (link.name, link.href))
                .collect(),
            webpage: self.links.html.href,
            slug: self.slug,
            full_name: self.full_name,
            scm: self.scm,
            size: self.size,
            access: Access::from_private(self.is_private),
            raw,
        }
    }
}
