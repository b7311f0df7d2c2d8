use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::errors::RipioError;

/// A supported hosting platform.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Site {
    Bitbucket,
    GitHub,
}

impl Site {
    /// Every known site, in the order workspaces are searched.
    pub const ALL: [Site; 2] = [Site::Bitbucket, Site::GitHub];

    pub fn name(self) -> &'static str {
        match self {
            Site::Bitbucket => "bitbucket",
            Site::GitHub => "github",
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            Site::Bitbucket => "bb",
            Site::GitHub => "gh",
        }
    }

    /// The host used by the site's web pages and git remotes.
    pub fn host(self) -> &'static str {
        match self {
            Site::Bitbucket => "bitbucket.org",
            Site::GitHub => "github.com",
        }
    }

    pub fn from_host(host: &str) -> Option<Site> {
        Site::ALL
            .iter()
            .cloned()
            .find(|site| site.host().eq_ignore_ascii_case(host))
    }
}

impl FromStr for Site {
    type Err = RipioError;

    /// Accepts both the canonical name and the abbreviation.
    fn from_str(s: &str) -> Result<Site, RipioError> {
        Site::ALL
            .iter()
            .cloned()
            .find(|site| site.name() == s || site.abbreviation() == s)
            .ok_or_else(|| RipioError::UnsupportedSite(s.to_string()))
    }
}

impl Display for Site {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviations_resolve_to_the_same_site() {
        assert_eq!("bb".parse::<Site>().unwrap(), Site::Bitbucket);
        assert_eq!("bitbucket".parse::<Site>().unwrap(), Site::Bitbucket);
        assert_eq!("gh".parse::<Site>().unwrap(), Site::GitHub);
        assert_eq!("github".parse::<Site>().unwrap(), Site::GitHub);
    }

    #[test]
    fn unknown_sites_are_unsupported() {
        let err = "gitlab".parse::<Site>().unwrap_err();

        assert_eq!(err, RipioError::UnsupportedSite("gitlab".into()));
    }

    #[test]
    fn hosts_map_to_sites() {
        assert_eq!(Site::from_host("github.com"), Some(Site::GitHub));
        assert_eq!(Site::from_host("bitbucket.org"), Some(Site::Bitbucket));
        assert_eq!(Site::from_host("gitlab.com"), None);
    }
}
