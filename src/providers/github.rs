use reqwest::Url;
use serde_json::{json, Value};
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use super::pagination::next_link;
use super::{
    check_reply, parse_url, remote_error, says_already_exists, Access, CommitInfo, Page,
    RepositoryMetadata, RepositorySummary, SiteAdapter,
};
use crate::client::{HttpClient, Method, Request, Response};
use crate::credentials::Authenticator;
use crate::errors::RipioError;
use crate::names::{RepoReference, WorkspaceName};
use crate::site::Site;

const API_ROOT: &str = "https://api.github.com";
const MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const PER_PAGE: usize = 100;

/// GitHub, through its v3 REST API.
#[derive(Clone)]
pub struct GitHub {
    client: Rc<dyn HttpClient>,
    auth: Authenticator,
}

impl GitHub {
    pub fn new(client: Rc<dyn HttpClient>, auth: Authenticator) -> GitHub {
        GitHub { client, auth }
    }

    fn repo_url(&self, reference: &RepoReference) -> Result<Url, RipioError> {
        parse_url(&format!(
            "{}/repos/{}/{}",
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
            401 => RipioError::AccessDenied(subject.to_string()),
            403 if is_rate_limited(response) => RipioError::RateLimitExceeded(subject.to_string()),
            403 => RipioError::AccessDenied(subject.to_string()),
            404 => RipioError::RepositoryNotFound(subject.to_string()),
            429 => RipioError::RateLimitExceeded(subject.to_string()),
            _ => remote_error(response, error_details),
        }
    }
}

impl SiteAdapter for GitHub {
    fn site(&self) -> Site {
        Site::GitHub
    }

    fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    /// Our own account is listed through `/user/repos`, which also includes
    /// private repositories. Anybody else may be an organisation or a user,
    /// so ask for the organisation first.
    fn first_page(&self, workspace: &WorkspaceName) -> Result<Url, RipioError> {
        let name = &workspace.workspace;

        if self.auth.is_own_workspace(name) {
            return parse_url(&format!(
                "{}/user/repos?affiliation=owner&per_page={}",
                API_ROOT, PER_PAGE
            ));
        }

        let org_url = parse_url(&format!(
            "{}/orgs/{}/repos?per_page={}",
            API_ROOT, name, PER_PAGE
        ))?;
        let org_reply = self.send(Request::get(org_url.clone()))?;

        match org_reply.status {
            404 => {
                info!("'{}' is not an organization. Trying as user.", name);
                parse_url(&format!(
                    "{}/users/{}/repos?per_page={}",
                    API_ROOT, name, PER_PAGE
                ))
            }
            _ => {
                let subject = workspace.to_string();
                check_reply(org_reply, &[200], |r| self.classify(&subject, r))?;
                Ok(org_url)
            }
        }
    }

    fn fetch_page(&self, workspace: &WorkspaceName, url: &Url) -> Result<Page, RipioError> {
        let subject = workspace.to_string();
        let response = self.send(Request::get(url.clone()))?;
        let response = check_reply(response, &[200], |r| self.classify(&subject, r))?;

        let next = match response.header("link").and_then(next_link) {
            Some(next) => Some(parse_url(next)?),
            None => None,
        };
        let raw: Vec<RawRepo> = response.json()?;
        let repositories = raw
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
        let owner = reference.workspace();

        let url = if self.auth.is_own_workspace(owner) {
            parse_url(&format!("{}/user/repos", API_ROOT))?
        } else {
            parse_url(&format!("{}/orgs/{}/repos", API_ROOT, owner))?
        };
        let request = Request::new(Method::Post, url)
            .json(json!({"name": reference.slug, "private": private}));

        let response = self.send(request)?;
        let response = check_reply(response, &[201], |r| {
            if r.status == 422 && says_already_exists(r) {
                RipioError::AlreadyExists(subject.clone())
            } else {
                self.classify(&subject, r)
            }
        })?;

        let created: RawRepo = response.json()?;
        Ok(created.name)
    }

    fn rename(&self, reference: &RepoReference, new_slug: &str) -> Result<String, RipioError> {
        let subject = reference.global_name();
        let request =
            Request::new(Method::Patch, self.repo_url(reference)?).json(json!({"name": new_slug}));

        let response = self.send(request)?;
        let response = check_reply(response, &[200], |r| self.classify(&subject, r))?;

        let renamed: RawRepo = response.json()?;
        Ok(renamed
            .name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string())
    }

    fn delete(&self, reference: &RepoReference) -> Result<(), RipioError> {
        let subject = reference.global_name();
        let response = self.send(Request::new(Method::Delete, self.repo_url(reference)?))?;
        check_reply(response, &[204], |r| self.classify(&subject, r))?;

        Ok(())
    }

    /// An empty repository has no commits, GitHub replies `409 Conflict`.
    fn commits(
        &self,
        reference: &RepoReference,
        limit: usize,
    ) -> Result<Vec<CommitInfo>, RipioError> {
        let subject = reference.global_name();
        let url = parse_url(&format!(
            "{}/commits?per_page={}",
            self.repo_url(reference)?,
            limit
        ))?;

        let response = self.send(Request::get(url))?;
        let response = check_reply(response, &[200, 409], |r| self.classify(&subject, r))?;
        if response.status == 409 {
            return Ok(Vec::new());
        }

        let commits: Vec<RawCommit> = response.json()?;

        Ok(commits
            .into_iter()
            .take(limit)
            .map(|c| CommitInfo {
                hash: c.sha,
                author: format!("{} <{}>", c.commit.author.name, c.commit.author.email),
                date: c.commit.author.date,
                message: c.commit.message,
            })
            .collect())
    }
}

impl Debug for GitHub {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("GitHub").field("auth", &self.auth).finish()
    }
}

fn is_rate_limited(response: &Response) -> bool {
    response.header("x-ratelimit-remaining") == Some("0")
}

/// GitHub explains itself with `{"message", "errors": [{"message"}]}`.
fn error_details(body: &Value) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(message) = body["message"].as_str() {
        lines.push(message.to_string());
    }
    if let Some(message) = body["errors"][0]["message"].as_str() {
        lines.push(message.to_string());
    }

    lines
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawRepo {
    name: String,
    full_name: String,
    /// In KiB.
    size: u64,
    private: bool,
    owner: Owner,
    ssh_url: String,
    clone_url: String,
    html_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Owner {
    login: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawCommit {
    sha: String,
    commit: RawCommitDetail,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawCommitDetail {
    author: RawAuthor,
    message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawAuthor {
    name: String,
    email: String,
    date: String,
}

impl RawRepo {
    fn into_summary(self) -> Result<RepositorySummary, RipioError> {
        let reference = RepoReference::from_parts(&self.owner.login, &self.name, Some(Site::GitHub))?;

        Ok(RepositorySummary {
            reference,
            scm: "git".to_string(),
            size: self.size * 1024,
            access: Access::from_private(self.private),
        })
    }

    fn into_metadata(self, raw: Value) -> RepositoryMetadata {
        let mut clone_links = std::collections::BTreeMap::new();
        clone_links.insert("ssh".to_string(), self.ssh_url);
        clone_links.insert("https".to_string(), self.clone_url);

        RepositoryMetadata {
            slug: self.name,
            full_name: self.full_name,
            scm: "git".to_string(),
            size: self.size * 1024,
            access: Access::from_private(self.private),
            clone_links,
            webpage: self.html_url,
            raw,
        }
    }
}
