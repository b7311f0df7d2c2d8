use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use crate::errors::RipioError;
use crate::names::{RepoReference, WorkspaceName};
use crate::providers::{self, Paginated, SiteAdapter};
use crate::repository::Repository;

/// The repositories of a user or team on some site.
pub struct Workspace {
    name: WorkspaceName,
    adapter: Rc<dyn SiteAdapter>,
}

impl Workspace {
    pub fn new(name: WorkspaceName, adapter: Rc<dyn SiteAdapter>) -> Workspace {
        Workspace { name, adapter }
    }

    /// Start a fresh walk over the workspace's repositories.
    pub fn repositories(&self) -> Result<Repositories, RipioError> {
        debug!("Listing repositories in {}", self.name);

        Ok(Repositories {
            pages: providers::list(&self.adapter, &self.name)?,
            adapter: Rc::clone(&self.adapter),
        })
    }

    /// The repository called `slug` in this workspace, which may or may not
    /// exist.
    pub fn make_repo(&self, slug: &str) -> Result<Repository, RipioError> {
        let reference = RepoReference::from_parts(&self.name.workspace, slug, Some(self.name.site))?;
        Ok(Repository::new(reference, Rc::clone(&self.adapter)))
    }
}

impl Debug for Workspace {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "<Workspace '{}'>", self.name)
    }
}

/// The iterator returned by [`Workspace::repositories()`].
pub struct Repositories {
    pages: Paginated,
    adapter: Rc<dyn SiteAdapter>,
}

impl Iterator for Repositories {
    type Item = Result<Repository, RipioError>;

    fn next(&mut self) -> Option<Self::Item> {
        let adapter = &self.adapter;
        self.pages
            .next()
            .map(|summary| summary.map(|s| Repository::from_summary(s, Rc::clone(adapter))))
    }
}

impl Debug for Repositories {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Repositories")
            .field("pages", &self.pages)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{adapter_for, Access};
    use crate::site::Site;
    use crate::testing::FakeClient;
    use reqwest::Url;
    use serde_json::json;

    #[test]
    fn an_empty_organization() {
        let org = "https://api.github.com/orgs/ripio-test/repos?per_page=100";
        let client = Rc::new(FakeClient::new().on_json("GET", org, 200, json!([])));
        let adapter = adapter_for(Site::GitHub, None, client.clone());
        let ws = Workspace::new(WorkspaceName::new(Site::GitHub, "ripio-test"), adapter);

        let repos: Vec<Repository> = ws.repositories().unwrap().collect::<Result<_, _>>().unwrap();

        assert!(repos.is_empty());
        // the organization check, then the page itself
        assert_eq!(client.requests().len(), 2);
    }

    #[test]
    fn repositories_carry_their_summary() {
        let first = "https://api.bitbucket.org/2.0/repositories/ripio-test?sort=slug";
        let second = "https://api.bitbucket.org/2.0/repositories/ripio-test?sort=slug&page=2";
        let client = Rc::new(
            FakeClient::new()
                .on_json(
                    "GET",
                    first,
                    200,
                    json!({
                        "values": [{"slug": "repo0", "full_name": "ripio-test/repo0", "scm": "git", "size": 1, "is_private": false}],
                        "next": second,
                    }),
                )
                .on_json(
                    "GET",
                    second,
                    200,
                    json!({
                        "values": [{"slug": "private", "full_name": "ripio-test/private", "scm": "hg", "size": 2, "is_private": true}],
                    }),
                ),
        );
        let adapter = adapter_for(Site::Bitbucket, None, client.clone());
        let ws = Workspace::new(WorkspaceName::new(Site::Bitbucket, "ripio-test"), adapter);

        let mut repos: Vec<Repository> = ws.repositories().unwrap().collect::<Result<_, _>>().unwrap();

        let names: Vec<String> = repos.iter().map(|r| r.full_name()).collect();
        assert_eq!(names, vec!["ripio-test/repo0", "ripio-test/private"]);
        assert_eq!(repos[1].access().unwrap(), Access::Private);
        assert_eq!(repos[1].size().unwrap(), 2);
        assert_eq!(client.requests().len(), 2);
        assert_eq!(
            client.requests()[1],
            format!("GET {}", Url::parse(second).unwrap())
        );
    }

    #[test]
    fn listing_can_be_restarted() {
        let client = Rc::new(FakeClient::new().on_json(
            "GET",
            "https://api.bitbucket.org/2.0/repositories/ripio-test?sort=slug",
            200,
            json!({"values": [{"slug": "repo0", "full_name": "ripio-test/repo0"}]}),
        ));
        let adapter = adapter_for(Site::Bitbucket, None, client.clone());
        let ws = Workspace::new(WorkspaceName::new(Site::Bitbucket, "ripio-test"), adapter);

        assert_eq!(ws.repositories().unwrap().count(), 1);
        assert_eq!(ws.repositories().unwrap().count(), 1);
        assert_eq!(client.requests().len(), 2);
    }

    #[test]
    fn make_a_repository() {
        let client = Rc::new(FakeClient::new());
        let adapter = adapter_for(Site::GitHub, None, client);
        let ws = Workspace::new(WorkspaceName::new(Site::GitHub, "ripio-test"), adapter);

        let repo = ws.make_repo("repo1").unwrap();

        assert_eq!(repo.reference().global_name(), "github:ripio-test/repo1");
        assert!(ws.make_repo("a/b").is_err());
    }
}
