//! Manage git repositories hosted on Bitbucket and GitHub.
//!
//! Repositories are named with references of the form `site:owner/slug`
//! (e.g. `github:twitter/wordpress` or `bb:paypal/example`). A bare slug can
//! be completed against the workspaces listed in the config file, see
//! [`Completion`].

extern crate failure;
#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate log;
extern crate once_cell;
extern crate regex;
extern crate reqwest;
extern crate sec;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate shellexpand;
extern crate toml;

pub mod client;
pub mod completion;
pub mod config;
pub mod credentials;
pub mod driver;
pub mod errors;
pub mod git;
pub mod names;
pub mod providers;
pub mod repository;
pub mod site;
pub mod utils;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use crate::client::{HttpClient, ReqwestClient};
pub use crate::completion::{Completion, WorkspaceSource};
pub use crate::config::Config;
pub use crate::credentials::{Authenticator, Credentials};
pub use crate::driver::Driver;
pub use crate::errors::RipioError;
pub use crate::git::{Git, GitTool};
pub use crate::names::{RepoReference, WorkspaceName};
pub use crate::providers::{adapter_for, SiteAdapter};
pub use crate::repository::{Protocol, Repository};
pub use crate::site::Site;
pub use crate::workspace::Workspace;
