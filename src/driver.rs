use failure::{Error, ResultExt};
use std::io::{BufRead, Write};
use std::path::Path;
use std::rc::Rc;

use crate::client::{HttpClient, ReqwestClient};
use crate::completion::Completion;
use crate::config::Config;
use crate::credentials::safe_url;
use crate::errors::RipioError;
use crate::git::{find_working_copy, Git, GitTool};
use crate::names::{RepoReference, WorkspaceName};
use crate::providers::{adapter_for, SiteAdapter};
use crate::repository::{Protocol, Repository};
use crate::site::Site;
use crate::utils;
use crate::workspace::Workspace;

/// How many commits `head` shows.
const HEAD_COMMITS: usize = 3;

/// Runs the command line's commands, writing their report to `out`.
pub struct Driver {
    config: Config,
    client: Rc<dyn HttpClient>,
    git: Rc<dyn GitTool>,
}

impl Driver {
    /// A driver talking to the real sites and the real `git`.
    pub fn with_config(config: Config) -> Result<Driver, Error> {
        let client = ReqwestClient::new().context("Unable to create the HTTP client")?;
        Ok(Driver::new(config, Rc::new(client), Rc::new(Git)))
    }

    pub fn new(config: Config, client: Rc<dyn HttpClient>, git: Rc<dyn GitTool>) -> Driver {
        Driver {
            config,
            client,
            git,
        }
    }

    fn adapter(&self, site: Site) -> Result<Rc<dyn SiteAdapter>, Error> {
        let credentials = self.config.credentials(site)?;
        Ok(adapter_for(site, credentials, Rc::clone(&self.client)))
    }

    pub fn repository(&self, reference: RepoReference) -> Result<Repository, Error> {
        let adapter = self.adapter(reference.site())?;
        Ok(Repository::new(reference, adapter))
    }

    /// The site for an owner typed without one, if the config names it on
    /// exactly one site.
    fn default_site(&self, owner: &str) -> Result<Option<Site>, Error> {
        if owner.contains(':') {
            return Ok(None);
        }

        Completion::default_site(owner, &self.config).map_err(Into::into)
    }

    /// Turn whatever the user typed into a repository reference, searching
    /// the configured workspaces for bare names when `guess` is set.
    ///
    /// A bare `owner/slug` is taken to be on the site whose workspaces list
    /// `owner`.
    pub fn resolve(&self, name: &str, guess: bool, out: &mut dyn Write) -> Result<RepoReference, Error> {
        let default_site = match name.split_once('/') {
            Some((owner, _)) => self.default_site(owner)?,
            None => None,
        };

        match RepoReference::parse(name, default_site) {
            Ok(reference) => {
                writeln!(out, "- repository identity is '{}'", reference)?;
                return Ok(reference);
            }
            Err(RipioError::BadRepositoryName(_)) if guess && !name.contains('/') => {}
            Err(e) => return Err(e.into()),
        }

        writeln!(out, "- trying to complete '{}' at known workspaces...", name)?;
        let completion = Completion::resolve(name, &self.config, Rc::clone(&self.client))?;

        if let Some(found) = completion.unique() {
            writeln!(out, "- guessing '{}'", found)?;
            return Ok(found.clone());
        }

        if completion.found.len() > 1 {
            writeln!(out, "- several completions found:")?;
            for reference in &completion.found {
                writeln!(out, "  - {}", reference)?;
            }

            let names: Vec<String> = completion.found.iter().map(|r| r.global_name()).collect();
            return Err(RipioError::AmbiguousCompletion(names.join(", ")).into());
        }

        match completion.denied.first() {
            Some(denied) => Err(RipioError::AccessDenied(denied.global_name()).into()),
            None => Err(RipioError::WrongCompletion(name.to_string()).into()),
        }
    }

    fn resolve_repo(&self, name: &str, guess: bool, out: &mut dyn Write) -> Result<Repository, Error> {
        let reference = self.resolve(name, guess, out)?;
        self.repository(reference)
    }

    /// List every repository in a workspace.
    pub fn ls(&self, owner: &str, out: &mut dyn Write) -> Result<(), Error> {
        let name = WorkspaceName::parse(owner, self.default_site(owner)?)?;
        let workspace = Workspace::new(name.clone(), self.adapter(name.site)?);

        for (i, repo) in workspace.repositories()?.enumerate() {
            let mut repo = repo?;
            writeln!(
                out,
                "{:>4}. {:>10} - {:<3} - {:<7} - {:<20}",
                i + 1,
                utils::to_kb(repo.size()?),
                repo.scm()?,
                repo.access()?.to_string(),
                repo.full_name()
            )?;
        }

        Ok(())
    }

    /// Show the most recent commits.
    pub fn head(&self, name: &str, out: &mut dyn Write) -> Result<(), Error> {
        let repo = self.resolve_repo(name, true, out)?;
        let commits = repo.last_commits(HEAD_COMMITS)?;

        if commits.is_empty() {
            writeln!(out, "- repository '{}' is empty", repo.full_name())?;
            return Ok(());
        }

        for commit in commits {
            writeln!(
                out,
                "-- {}\n   {}\n   {}\n\n   {}",
                commit.hash,
                commit.author,
                commit.date,
                commit.message.trim_end()
            )?;
        }

        Ok(())
    }

    pub fn rename(&self, name: &str, new_name: &str, out: &mut dyn Write) -> Result<(), Error> {
        let mut repo = self.resolve_repo(name, true, out)?;
        let new_slug = repo.rename(new_name)?;

        writeln!(
            out,
            "- repository '{}' renamed as '{}/{}'",
            repo.full_name(),
            repo.reference().workspace(),
            new_slug
        )?;
        Ok(())
    }

    /// Create a repository (private unless `public`), optionally cloning it
    /// straight away.
    pub fn create(&self, name: &str, public: bool, clone: bool, out: &mut dyn Write) -> Result<(), Error> {
        let repo = self.resolve_repo(name, false, out)?;
        let slug = repo.create(!public)?;

        let reference = RepoReference::from_parts(repo.reference().workspace(), &slug, Some(repo.site()))?;
        writeln!(out, "- repository '{}' created", reference)?;

        if clone {
            let mut created = self.repository(reference)?;
            self.clone_repo(&mut created, Protocol::Ssh, None, out)?;
        }

        Ok(())
    }

    /// Delete a repository, once the user has confirmed it on `input`.
    pub fn delete(&self, name: &str, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<(), Error> {
        let mut repo = self.resolve_repo(name, true, out)?;
        repo.check()?;

        if !utils::confirm_irrecoverable_operation(input, out)? {
            writeln!(out)?;
            return Err(RipioError::Aborted(format!("'{}' was not deleted", repo.full_name())).into());
        }

        writeln!(out, "- deleting '{}'", repo.full_name())?;
        repo.delete()?;
        Ok(())
    }

    /// Clone a repository into `destdir` (or the configured directory).
    pub fn clone(
        &self,
        name: &str,
        protocol: Protocol,
        destdir: Option<&Path>,
        out: &mut dyn Write,
    ) -> Result<(), Error> {
        let mut repo = self.resolve_repo(name, true, out)?;
        self.clone_repo(&mut repo, protocol, destdir, out)
    }

    fn clone_repo(
        &self,
        repo: &mut Repository,
        protocol: Protocol,
        destdir: Option<&Path>,
        out: &mut dyn Write,
    ) -> Result<(), Error> {
        let destdir = match destdir {
            Some(dir) => dir.to_path_buf(),
            None => self.config.destdir()?,
        };
        let dest = destdir.join(repo.slug());

        writeln!(
            out,
            "- cloning({}) '{}' to '{}'",
            protocol,
            repo.full_name(),
            utils::pretty_path(&dest)
        )?;

        let mut dash = |_: &str| {
            let _ = write!(out, "-");
            let _ = out.flush();
        };
        let outcome = repo.clone_into(&dest, protocol, &*self.git, &mut dash);
        writeln!(out)?;

        outcome.map_err(Into::into)
    }

    /// Describe a repository, by default the one checked out in `cwd`.
    pub fn info(&self, name: Option<&str>, cwd: &Path, out: &mut dyn Write) -> Result<(), Error> {
        let mut repo = match name {
            Some(name) => self.resolve_repo(name, true, out)?,
            None => self.current_repository(cwd)?,
        };

        writeln!(out, "- name: {}", repo.reference().global_name())?;
        writeln!(out, "- access: {}", repo.access()?)?;
        writeln!(out, "- scm: {}", repo.scm()?)?;
        writeln!(out, "- size: {}", utils::to_kb(repo.size()?))?;
        writeln!(out, "- webpage: {}", repo.webpage()?)?;
        writeln!(out, "- clone links:")?;
        for (protocol, url) in repo.clone_links()? {
            writeln!(out, "  - {}: {}", protocol, safe_url(url))?;
        }

        Ok(())
    }

    /// The web page of the repository checked out in `cwd`.
    pub fn site(&self, cwd: &Path, out: &mut dyn Write) -> Result<String, Error> {
        let mut repo = self.current_repository(cwd)?;
        let url = repo.webpage()?;

        writeln!(out, "- opening '{}'", url)?;
        Ok(url)
    }

    pub fn show_config(&self, example: bool, out: &mut dyn Write) -> Result<(), Error> {
        let cfg = if example {
            Config::example()
        } else {
            self.config.redacted()
        };

        write!(out, "{}", cfg.as_toml())?;
        Ok(())
    }

    /// The repository whose working copy contains `cwd`, found through its
    /// `origin` remote.
    fn current_repository(&self, cwd: &Path) -> Result<Repository, Error> {
        let root = find_working_copy(cwd).ok_or_else(|| {
            RipioError::BadRepositoryName(format!("{} is not in a git working copy", cwd.display()))
        })?;

        let origin = self
            .git
            .origin_url(&root)
            .with_context(|_| format!("Unable to find the origin of {}", root.display()))?;
        debug!("{} was cloned from {}", root.display(), safe_url(&origin));

        let reference = RepoReference::from_origin(&origin)?;
        self.repository(reference)
    }
}
