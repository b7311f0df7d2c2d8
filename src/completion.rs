//! Guessing the full reference of a repository from its bare slug.

use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

use crate::client::HttpClient;
use crate::credentials::Credentials;
use crate::errors::RipioError;
use crate::names::{RepoReference, WorkspaceName};
use crate::providers::adapter_for;
use crate::site::Site;
use crate::workspace::Workspace;

/// Where [`Completion`] learns which workspaces to search.
pub trait WorkspaceSource {
    fn credentials(&self, site: Site) -> Result<Option<Credentials>, RipioError>;

    /// The workspaces configured for a site, in the order they were given.
    fn workspaces(&self, site: Site) -> Vec<String>;
}

/// The outcome of searching the known workspaces for a repository.
///
/// Deciding what to do with several matches (or only denials) is up to the
/// caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub found: Vec<RepoReference>,
    pub denied: Vec<RepoReference>,
}

impl Completion {
    /// Resolve `name`, which may be a full reference, a bare slug or a
    /// `site:slug`.
    pub fn resolve(
        name: &str,
        source: &dyn WorkspaceSource,
        client: Rc<dyn HttpClient>,
    ) -> Result<Completion, RipioError> {
        match RepoReference::parse(name, None) {
            Ok(reference) => {
                return Ok(Completion {
                    found: vec![reference],
                    denied: Vec::new(),
                })
            }
            Err(RipioError::BadRepositoryName(_)) if !name.contains('/') => {}
            Err(other) => return Err(other),
        }

        let mut candidates = Completion::candidates(source)?;
        if candidates.is_empty() {
            return Err(RipioError::ConfigError(
                "Requires keys '*.workspaces' to guess repo urls".to_string(),
            ));
        }

        let slug = match name.split_once(':') {
            Some((prefix, slug)) => {
                let site: Site = prefix.parse()?;
                candidates.retain(|candidate| candidate.site == site);
                slug
            }
            None => name,
        };
        debug!(
            "Looking for '{}' in {}",
            slug,
            Candidates(&candidates)
        );

        let mut completion = Completion::default();
        for site in Site::ALL.iter().copied() {
            let workspaces: Vec<&WorkspaceName> =
                candidates.iter().filter(|c| c.site == site).collect();
            if workspaces.is_empty() {
                continue;
            }
            let adapter = adapter_for(site, source.credentials(site)?, Rc::clone(&client));

            for name in workspaces {
                let workspace = Workspace::new(name.clone(), Rc::clone(&adapter));
                let mut repo = workspace.make_repo(slug)?;
                let reference = repo.reference().clone();

                match repo.exists_strict() {
                    Ok(true) => {
                        info!("Found {}", reference);
                        completion.found.push(reference);
                    }
                    Ok(false) => trace!("No {}", reference),
                    Err(ref e) if e.is_access_denied() => {
                        info!("Access denied to {}", reference);
                        completion.denied.push(reference);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if completion.found.is_empty() && completion.denied.is_empty() {
            return Err(RipioError::WrongCompletion(format!(
                "No guess found for any known workspace: '{}'",
                Candidates(&candidates)
            )));
        }

        Ok(completion)
    }

    /// Every workspace worth searching, site by site. Our own account comes
    /// before the configured workspaces.
    ///
    /// A configured workspace must be a plain name (or carry its own site's
    /// prefix), anything else is a `ConfigError`.
    pub fn candidates(source: &dyn WorkspaceSource) -> Result<Vec<WorkspaceName>, RipioError> {
        let mut candidates: Vec<WorkspaceName> = Vec::new();

        for site in Site::ALL.iter().copied() {
            let own = source
                .credentials(site)?
                .map(|creds| creds.username().to_string());

            for workspace in own.into_iter().chain(source.workspaces(site)) {
                let candidate = match WorkspaceName::parse(&workspace, Some(site)) {
                    Ok(ref name) if name.site != site => {
                        return Err(RipioError::ConfigError(format!(
                            "{}.workspaces: '{}' belongs to {}",
                            site, workspace, name.site
                        )))
                    }
                    Ok(name) => name,
                    Err(_) => {
                        return Err(RipioError::ConfigError(format!(
                            "{}.workspaces: '{}' is not a workspace name",
                            site, workspace
                        )))
                    }
                };

                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }

        Ok(candidates)
    }

    /// The site a bare `owner` lives on, judged by which site's candidates
    /// list it. `None` when no site does.
    pub fn default_site(owner: &str, source: &dyn WorkspaceSource) -> Result<Option<Site>, RipioError> {
        let mut matching: Vec<WorkspaceName> = Completion::candidates(source)?
            .into_iter()
            .filter(|c| c.workspace.eq_ignore_ascii_case(owner))
            .collect();
        matching.dedup_by_key(|c| c.site);

        match matching.as_slice() {
            [] => Ok(None),
            [only] => {
                debug!("'{}' is a known workspace at {}", owner, only.site);
                Ok(Some(only.site))
            }
            several => Err(RipioError::AmbiguousCompletion(
                Candidates(several).to_string(),
            )),
        }
    }

    /// The single repository found, if there is exactly one.
    pub fn unique(&self) -> Option<&RepoReference> {
        match self.found.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

struct Candidates<'a>(&'a [WorkspaceName]);

impl<'a> Display for Candidates<'a> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for (i, candidate) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", candidate)?;
        }
        Ok(())
    }
}
