use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::completion::WorkspaceSource;
use crate::credentials::Credentials;
use crate::errors::RipioError;
use crate::site::Site;

/// Printed when there is no config file to load.
pub const CONFIG_USAGE: &str = r#"ERROR: No config file available.

Provide a config file with --config argument or default location: ~/.config/ripio.

    [clone]
    destdir = "~/repos"

    [bitbucket]
    workspaces = ["team1", "team2"]

    [bitbucket.credentials]
    default = "JohnDoe:secret"

    [github]
    workspaces = ["org1", "org2"]

    [github.credentials]
    default = "JohnDoe:secret"

Use these features to create "safe" passwords:
- https://bitbucket.org/account/settings/app-passwords/
- https://github.com/settings/tokens
"#;

/// The contents of the config file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub clone: CloneConfig,
    pub bitbucket: SiteConfig,
    pub github: SiteConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloneConfig {
    /// Where repositories are cloned to, `~` and environment variables are
    /// expanded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destdir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Workspaces searched when completing a bare repository name.
    pub workspaces: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialsConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// `username:password`, preferably an app password or token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, RipioError> {
        let path = path.as_ref();
        debug!("Loading config from {}", path.display());

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(ref e) if e.kind() == ErrorKind::NotFound => {
                return Err(RipioError::MissingConfig(path.display().to_string()))
            }
            Err(e) => {
                return Err(RipioError::ConfigError(format!(
                    "unable to read {}, {}",
                    path.display(),
                    e
                )))
            }
        };

        Config::parse(&text)
            .map_err(|e| RipioError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(text: &str) -> Result<Config, RipioError> {
        toml::from_str(text).map_err(|e| RipioError::ConfigError(e.to_string()))
    }

    /// A config showing off every setting.
    pub fn example() -> Config {
        let site = |workspaces: &[&str]| SiteConfig {
            workspaces: workspaces.iter().map(|s| s.to_string()).collect(),
            credentials: Some(CredentialsConfig {
                default: Some("JohnDoe:secret".to_string()),
            }),
        };

        Config {
            clone: CloneConfig {
                destdir: Some("~/repos".to_string()),
            },
            bitbucket: site(&["team1", "team2"]),
            github: site(&["org1", "org2"]),
        }
    }

    pub fn as_toml(&self) -> String {
        match toml::to_string_pretty(self) {
            Ok(s) => s,
            Err(e) => {
                error!("Unable to serialize the config, {}", e);
                String::new()
            }
        }
    }

    /// A copy which is safe to show, with every password masked.
    pub fn redacted(&self) -> Config {
        let mut cfg = self.clone();

        for site in vec![&mut cfg.bitbucket, &mut cfg.github] {
            if let Some(CredentialsConfig {
                default: Some(ref mut text),
            }) = site.credentials
            {
                if let Ok(creds) = Credentials::parse(text) {
                    *text = creds.to_string();
                }
            }
        }

        cfg
    }

    pub fn site(&self, site: Site) -> &SiteConfig {
        match site {
            Site::Bitbucket => &self.bitbucket,
            Site::GitHub => &self.github,
        }
    }

    /// The credentials for a site, if it has any.
    pub fn credentials(&self, site: Site) -> Result<Option<Credentials>, RipioError> {
        match self.site(site).credentials {
            Some(CredentialsConfig {
                default: Some(ref text),
            }) => Credentials::parse(text)
                .map(Some)
                .map_err(|_| RipioError::ConfigError(format!("{}.credentials.default", site))),
            _ => Ok(None),
        }
    }

    /// The directory repositories are cloned into, the current directory
    /// unless configured otherwise.
    pub fn destdir(&self) -> Result<PathBuf, RipioError> {
        match self.clone.destdir {
            Some(ref dir) => {
                let expanded = shellexpand::full(dir)
                    .map_err(|e| RipioError::ConfigError(format!("clone.destdir, {}", e)))?;
                Ok(PathBuf::from(expanded.into_owned()))
            }
            None => env::current_dir()
                .map_err(|e| RipioError::ConfigError(format!("no current directory, {}", e))),
        }
    }
}

impl WorkspaceSource for Config {
    fn credentials(&self, site: Site) -> Result<Option<Credentials>, RipioError> {
        Config::credentials(self, site)
    }

    fn workspaces(&self, site: Site) -> Vec<String> {
        self.site(site).workspaces.clone()
    }
}
