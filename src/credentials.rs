use reqwest::Url;
use sec::Secret;
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use crate::client::Request;
use crate::errors::RipioError;

/// A username and password (or API token).
///
/// The password is never shown, both `Display` and `Debug` mask it with one
/// `*` per character.
pub struct Credentials {
    username: String,
    password: Secret<String>,
}

impl Credentials {
    pub fn new<U, P>(username: U, password: P) -> Credentials
    where
        U: Into<String>,
        P: Into<String>,
    {
        Credentials {
            username: username.into(),
            password: Secret::new(password.into()),
        }
    }

    /// Parse a `user:password` string, splitting on the first `:`.
    pub fn parse(text: &str) -> Result<Credentials, RipioError> {
        match text.split_once(':') {
            Some((username, password)) if !username.is_empty() => {
                Ok(Credentials::new(username, password))
            }
            _ => Err(RipioError::ConfigError(
                "credentials must have the form 'user:password'".to_string(),
            )),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        self.password.reveal_str()
    }

    fn masked_password(&self) -> String {
        "*".repeat(self.password().chars().count())
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password())
    }
}

impl PartialEq for Credentials {
    fn eq(&self, other: &Credentials) -> bool {
        self.username == other.username && self.password() == other.password()
    }
}

impl Eq for Credentials {}

impl FromStr for Credentials {
    type Err = RipioError;

    fn from_str(s: &str) -> Result<Credentials, RipioError> {
        Credentials::parse(s)
    }
}

impl Display for Credentials {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.username, self.masked_password())
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "<Credentials '{}'>", self)
    }
}

/// Attaches a site's credentials to outgoing requests and clone URLs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Authenticator {
    credentials: Option<Credentials>,
}

impl Authenticator {
    pub fn new(credentials: Option<Credentials>) -> Authenticator {
        Authenticator { credentials }
    }

    /// Is `workspace` the account these credentials belong to? Account
    /// names are case-insensitive on both sites.
    pub fn is_own_workspace(&self, workspace: &str) -> bool {
        self.credentials
            .as_ref()
            .map(|creds| creds.username().eq_ignore_ascii_case(workspace))
            .unwrap_or(false)
    }

    /// Use basic auth on an API request.
    pub fn authenticate(&self, request: Request) -> Request {
        match self.credentials {
            Some(ref creds) => request.basic_auth(creds.clone()),
            None => request,
        }
    }

    /// Embed the credentials in a URL's userinfo, as git expects for
    /// authenticated HTTPS clones.
    pub fn embed(&self, url: &str) -> Result<String, RipioError> {
        let creds = match self.credentials {
            Some(ref creds) => creds,
            None => return Ok(url.to_string()),
        };

        let mut parsed =
            Url::parse(url).map_err(|_| RipioError::BadRepositoryName(url.to_string()))?;
        parsed
            .set_username(creds.username())
            .and_then(|_| parsed.set_password(Some(creds.password())))
            .map_err(|_| RipioError::BadRepositoryName(url.to_string()))?;

        Ok(parsed.as_str().to_string())
    }
}

/// Mask the password of a URL with embedded credentials, so it can be
/// logged or printed.
pub fn safe_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("****"));
            }
            parsed.as_str().to_string()
        }
        Err(_) => url.to_string(),
    }
}
