//! The sites repositories are hosted on.
//!
//! Each site speaks its own dialect of REST. A [`SiteAdapter`] translates the
//! handful of operations this crate needs into that dialect, and translates
//! the site's error replies back into a [`RipioError`].

use reqwest::Url;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

use crate::client::{HttpClient, Response};
use crate::credentials::{Authenticator, Credentials};
use crate::errors::RipioError;
use crate::names::{RepoReference, WorkspaceName};
use crate::site::Site;

mod bitbucket;
mod github;
mod pagination;

pub use self::bitbucket::Bitbucket;
pub use self::github::GitHub;
pub use self::pagination::{Page, Paginated};

/// Site specific plumbing behind a [`Repository`](crate::Repository) or a
/// [`Workspace`](crate::Workspace).
pub trait SiteAdapter {
    fn site(&self) -> Site;

    fn authenticator(&self) -> &Authenticator;

    /// The URL of the first page of a workspace's repository listing.
    fn first_page(&self, workspace: &WorkspaceName) -> Result<Url, RipioError>;

    /// Fetch one page of `workspace`'s listing. Errors are reported against
    /// the workspace, not the page URL.
    fn fetch_page(&self, workspace: &WorkspaceName, url: &Url) -> Result<Page, RipioError>;

    fn fetch(&self, reference: &RepoReference) -> Result<RepositoryMetadata, RipioError>;

    /// Create a repository, returning the slug the site gave it.
    fn create(&self, reference: &RepoReference, private: bool) -> Result<String, RipioError>;

    /// Rename a repository within its workspace, returning the new slug.
    fn rename(&self, reference: &RepoReference, new_slug: &str) -> Result<String, RipioError>;

    fn delete(&self, reference: &RepoReference) -> Result<(), RipioError>;

    /// The most recent commits, newest first.
    fn commits(&self, reference: &RepoReference, limit: usize)
        -> Result<Vec<CommitInfo>, RipioError>;
}

/// Get the adapter for a site.
pub fn adapter_for(
    site: Site,
    credentials: Option<Credentials>,
    client: Rc<dyn HttpClient>,
) -> Rc<dyn SiteAdapter> {
    let auth = Authenticator::new(credentials);

    match site {
        Site::Bitbucket => Rc::new(Bitbucket::new(client, auth)),
        Site::GitHub => Rc::new(GitHub::new(client, auth)),
    }
}

/// Lazily walk every page of a workspace's repository listing.
pub fn list(
    adapter: &Rc<dyn SiteAdapter>,
    workspace: &WorkspaceName,
) -> Result<Paginated, RipioError> {
    let first_page = adapter.first_page(workspace)?;
    Ok(Paginated::new(Rc::clone(adapter), workspace.clone(), first_page))
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    Public,
    Private,
}

impl Access {
    pub fn from_private(private: bool) -> Access {
        if private {
            Access::Private
        } else {
            Access::Public
        }
    }
}

impl Display for Access {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Access::Public => f.write_str("public"),
            Access::Private => f.write_str("private"),
        }
    }
}

/// What a listing page tells us about a repository.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositorySummary {
    pub reference: RepoReference,
    pub scm: String,
    /// Size in bytes.
    pub size: u64,
    pub access: Access,
}

/// Everything the site tells us about a single repository.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryMetadata {
    pub slug: String,
    pub full_name: String,
    pub scm: String,
    /// Size in bytes.
    pub size: u64,
    pub access: Access,
    /// Clone URLs, keyed by protocol (`ssh`, `https`).
    pub clone_links: BTreeMap<String, String>,
    pub webpage: String,
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    pub hash: String,
    pub author: String,
    pub date: String,
    pub message: String,
}

/// Pass the reply through if its status is one of `expected`, otherwise
/// turn it into an error with `classify`.
pub(crate) fn check_reply<F>(
    response: Response,
    expected: &[u16],
    classify: F,
) -> Result<Response, RipioError>
where
    F: FnOnce(&Response) -> RipioError,
{
    if expected.contains(&response.status) {
        Ok(response)
    } else {
        warn!("Request failed with {}", response.status);
        Err(classify(&response))
    }
}

/// Build the catch-all error for a reply the site specific mapping didn't
/// recognise. `details` extracts whatever explanation the site put in a
/// JSON body.
pub(crate) fn remote_error<F>(response: &Response, details: F) -> RipioError
where
    F: FnOnce(&Value) -> Vec<String>,
{
    let mut message = response.status_line();

    if response.is_json() {
        if let Ok(body) = response.json::<Value>() {
            for line in details(&body) {
                message.push('\n');
                message.push_str(&line);
            }
        }
    } else {
        let is_html = response
            .header("content-type")
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false);
        let text = response.text();

        if !is_html && !text.trim().is_empty() {
            message.push('\n');
            message.push_str(text.trim());
        }
    }

    RipioError::RemoteError {
        status: response.status,
        message,
    }
}

/// Did the site refuse to create a repository because the name is taken?
pub(crate) fn says_already_exists(response: &Response) -> bool {
    response.text().to_lowercase().contains("already exists")
}

pub(crate) fn parse_url(url: &str) -> Result<Url, RipioError> {
    Url::parse(url).map_err(|e| RipioError::RemoteError {
        status: 0,
        message: format!("invalid URL {:?}, {}", url, e),
    })
}
