use reqwest::Url;
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;
use std::vec::IntoIter;

use super::{RepositorySummary, SiteAdapter};
use crate::errors::RipioError;
use crate::names::WorkspaceName;

/// One page of a repository listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub next: Option<Url>,
    pub repositories: Vec<RepositorySummary>,
}

/// An iterator over every repository in a listing, fetching pages on demand.
///
/// Pages are fetched strictly one after the other because the location of
/// the next page is only known once the current one arrives. Iteration
/// stops after the first error.
pub struct Paginated {
    adapter: Rc<dyn SiteAdapter>,
    workspace: WorkspaceName,
    next_page: Option<Url>,
    items: IntoIter<RepositorySummary>,
}

impl Paginated {
    pub(crate) fn new(
        adapter: Rc<dyn SiteAdapter>,
        workspace: WorkspaceName,
        first_page: Url,
    ) -> Paginated {
        Paginated {
            adapter,
            workspace,
            next_page: Some(first_page),
            items: Vec::new().into_iter(),
        }
    }
}

impl Iterator for Paginated {
    type Item = Result<RepositorySummary, RipioError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(next_item) = self.items.next() {
                return Some(Ok(next_item));
            }

            let endpoint = self.next_page.take()?;
            debug!("Fetching page {}", endpoint);

            match self.adapter.fetch_page(&self.workspace, &endpoint) {
                Ok(Page { next, repositories }) => {
                    trace!("Got {} repositories", repositories.len());
                    self.next_page = next;
                    self.items = repositories.into_iter();
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl Debug for Paginated {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Paginated")
            .field("workspace", &self.workspace)
            .field("next_page", &self.next_page)
            .finish()
    }
}

/// Find the `rel="next"` target of an HTTP `Link` header.
pub(crate) fn next_link(header: &str) -> Option<&str> {
    header
        .split(',')
        .filter_map(|value| {
            let mut parts = value.split(';');
            let target = parts.next()?.trim();
            let target = target.strip_prefix('<')?.strip_suffix('>')?;

            if parts.any(is_next) {
                Some(target)
            } else {
                None
            }
        })
        .next()
}

fn is_next(param: &str) -> bool {
    match param.trim().split_once('=') {
        Some((key, value)) if key.trim() == "rel" => value
            .trim()
            .trim_matches('"')
            .split_whitespace()
            .any(|rel| rel == "next"),
        _ => false,
    }
}
