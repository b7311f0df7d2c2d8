//! The errors encountered in this crate.

/// Everything that can go wrong while talking to a site or touching the
/// local filesystem on behalf of a command.
///
/// The display form is `Kind: value`, which is exactly what the command line
/// prints for a failed command.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum RipioError {
    /// A repository reference without exactly one `/`, or an unparseable
    /// remote URL.
    #[fail(display = "BadRepositoryName: {}", _0)]
    BadRepositoryName(String),
    /// A workspace with more than one `:`, an embedded `/`, or no site.
    #[fail(display = "BadWorkspaceName: {}", _0)]
    BadWorkspaceName(String),
    #[fail(display = "UnsupportedSite: {}", _0)]
    UnsupportedSite(String),
    #[fail(display = "RepositoryNotFound: {}", _0)]
    RepositoryNotFound(String),
    #[fail(display = "AccessDenied: {}", _0)]
    AccessDenied(String),
    #[fail(display = "AlreadyExists: {}", _0)]
    AlreadyExists(String),
    #[fail(display = "ConfigError: {}", _0)]
    ConfigError(String),
    #[fail(display = "MissingConfig: {}", _0)]
    MissingConfig(String),
    /// Completing a short name found nothing, and nothing was denied either.
    #[fail(display = "WrongCompletion: {}", _0)]
    WrongCompletion(String),
    /// Completing a short name found more than one repository.
    #[fail(display = "AmbiguousCompletion: {}", _0)]
    AmbiguousCompletion(String),
    #[fail(display = "RateLimitExceeded: {}", _0)]
    RateLimitExceeded(String),
    /// The request never got a reply.
    #[fail(display = "NetworkError: {}", _0)]
    NetworkError(String),
    /// Any other unsuccessful reply, kept verbatim for display.
    #[fail(display = "RemoteError: {}", message)]
    RemoteError { status: u16, message: String },
    #[fail(display = "destination directory already EXISTS: {}", _0)]
    DirectoryAlreadyExists(String),
    #[fail(display = "RepositoryAlreadyCloned: {} is already at {}", reference, path)]
    RepositoryAlreadyCloned { reference: String, path: String },
    #[fail(display = "UnrelatedRepository: {} is a clone of {}", path, origin)]
    UnrelatedRepository { path: String, origin: String },
    #[fail(display = "GitFailed: `{}` - {}", command, message)]
    GitFailed { command: String, message: String },
    #[fail(display = "Aborted: {}", _0)]
    Aborted(String),
}

impl RipioError {
    pub fn is_not_found(&self) -> bool {
        match *self {
            RipioError::RepositoryNotFound(_) => true,
            _ => false,
        }
    }

    pub fn is_access_denied(&self) -> bool {
        match *self {
            RipioError::AccessDenied(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_kind_and_value() {
        let err = RipioError::RepositoryNotFound("github:ripio-test/private".into());

        assert_eq!(err.to_string(), "RepositoryNotFound: github:ripio-test/private");
    }

    #[test]
    fn remote_errors_show_their_message() {
        let err = RipioError::RemoteError {
            status: 500,
            message: "ERROR 500: Internal Server Error".into(),
        };

        assert_eq!(err.to_string(), "RemoteError: ERROR 500: Internal Server Error");
    }
}
