//! Parsing of user supplied workspace and repository names.
//!
//! The canonical form of a repository reference is `site:owner/slug`. Sites
//! may be abbreviated (`bb`, `gh`) and a git remote URL is accepted wherever
//! a reference is.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::errors::RipioError;
use crate::site::Site;

/// The scp-like, `ssh://` and `https://` forms of a git remote, each
/// capturing the host and the `owner/slug` path.
static REMOTE_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"^git@([^:/]+):(.+?)(?:\.git)?$").expect("Invalid regex"),
        Regex::new(r"^ssh://git@([^/:]+)(?::\d+)?/(.+?)(?:\.git)?$").expect("Invalid regex"),
        Regex::new(r"^https://(?:[^@/]+@)?([^/:@]+)(?::\d+)?/(.+?)(?:\.git)?/?$")
            .expect("Invalid regex"),
    ]
});

/// An owner namespace (user, team or organisation) on a particular site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkspaceName {
    pub site: Site,
    pub workspace: String,
}

impl WorkspaceName {
    pub fn new<S: Into<String>>(site: Site, workspace: S) -> WorkspaceName {
        WorkspaceName {
            site,
            workspace: workspace.into(),
        }
    }

    /// Parse `site:workspace`, falling back to `default_site` when there is
    /// no prefix.
    pub fn parse(text: &str, default_site: Option<Site>) -> Result<WorkspaceName, RipioError> {
        if text.matches(':').count() > 1 || text.contains('/') {
            return Err(RipioError::BadWorkspaceName(text.to_string()));
        }

        let (site, workspace) = match text.split_once(':') {
            Some((prefix, workspace)) => (prefix.parse::<Site>()?, workspace),
            None => match default_site {
                Some(site) => (site, text),
                None => return Err(RipioError::BadWorkspaceName(text.to_string())),
            },
        };

        if workspace.is_empty() {
            return Err(RipioError::BadWorkspaceName(text.to_string()));
        }

        Ok(WorkspaceName::new(site, workspace))
    }
}

impl Display for WorkspaceName {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.site, self.workspace)
    }
}

impl FromStr for WorkspaceName {
    type Err = RipioError;

    fn from_str(s: &str) -> Result<WorkspaceName, RipioError> {
        WorkspaceName::parse(s, None)
    }
}

/// The canonical `site:owner/slug` identifier of a repository.
///
/// Two references are equal when their global names are.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoReference {
    pub owner: WorkspaceName,
    pub slug: String,
}

impl RepoReference {
    /// Parse either a `[site:]owner/slug` name or a git remote URL.
    pub fn parse(text: &str, default_site: Option<Site>) -> Result<RepoReference, RipioError> {
        if is_remote_url(text) {
            RepoReference::from_origin(text)
        } else {
            RepoReference::from_full_name(text, default_site)
        }
    }

    /// Build a reference from a git remote URL, in any of the
    /// `git@host:owner/slug.git`, `ssh://git@host/owner/slug.git` or
    /// `https://host/owner/slug[.git]` forms.
    pub fn from_origin(url: &str) -> Result<RepoReference, RipioError> {
        let bad_name = || RipioError::BadRepositoryName(url.to_string());

        let (host, path) = REMOTE_PATTERNS
            .iter()
            .filter_map(|re| {
                re.captures(url)
                    .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            })
            .next()
            .ok_or_else(bad_name)?;

        let site = Site::from_host(&host).ok_or_else(bad_name)?;
        trace!("Remote {:?} is {}:{}", url, site, path);

        RepoReference::from_full_name(&path, Some(site))
    }

    /// Join a workspace and a slug into a reference.
    ///
    /// When `site` is given the workspace must be a plain name, a `site:`
    /// prefix of its own is rejected rather than overriding `site`.
    pub fn from_parts(
        workspace: &str,
        slug: &str,
        site: Option<Site>,
    ) -> Result<RepoReference, RipioError> {
        if site.is_some() && workspace.contains(':') {
            return Err(RipioError::BadWorkspaceName(workspace.to_string()));
        }

        RepoReference::from_full_name(&format!("{}/{}", workspace, slug), site)
    }

    fn from_full_name(text: &str, default_site: Option<Site>) -> Result<RepoReference, RipioError> {
        if text.matches('/').count() != 1 {
            return Err(RipioError::BadRepositoryName(text.to_string()));
        }

        let (owner, slug) = match text.split_once('/') {
            Some((owner, slug)) if !slug.is_empty() => (owner, slug),
            _ => return Err(RipioError::BadRepositoryName(text.to_string())),
        };

        Ok(RepoReference {
            owner: WorkspaceName::parse(owner, default_site)?,
            slug: slug.to_string(),
        })
    }

    pub fn site(&self) -> Site {
        self.owner.site
    }

    pub fn workspace(&self) -> &str {
        &self.owner.workspace
    }

    /// `owner/slug`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner.workspace, self.slug)
    }

    /// `site:owner/slug`
    pub fn global_name(&self) -> String {
        format!("{}:{}", self.owner.site, self.full_name())
    }
}

impl Display for RepoReference {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.global_name())
    }
}

impl FromStr for RepoReference {
    type Err = RipioError;

    fn from_str(s: &str) -> Result<RepoReference, RipioError> {
        RepoReference::parse(s, None)
    }
}

fn is_remote_url(text: &str) -> bool {
    ["https://", "git@", "ssh://"]
        .iter()
        .any(|scheme| text.starts_with(scheme))
}
