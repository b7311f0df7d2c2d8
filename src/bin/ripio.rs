extern crate chrono;
extern crate env_logger;
extern crate failure;
#[macro_use]
extern crate log;
extern crate ripio;
extern crate shellexpand;
extern crate structopt;
extern crate webbrowser;

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use chrono::Local;
use env_logger::Builder;
use failure::{Error, ResultExt};
use log::LevelFilter;
use structopt::StructOpt;

use ripio::config::CONFIG_USAGE;
use ripio::{Config, Driver, Protocol, RipioError};

fn main() {
    let args = Args::from_args();

    if let Err(e) = initialize_logging(&args) {
        eprintln!("Unable to initialize logging, {}", e);
    }

    match run(&args) {
        Ok(()) => println!("-- ok"),
        Err(e) => {
            report(&e, args.verbosity);
            println!("-- fail");
            process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let command = match args.cmd {
        Some(ref cmd) => cmd,
        None => {
            Args::clap().print_help()?;
            println!();
            return Err(RipioError::ConfigError("no command given".to_string()).into());
        }
    };

    if let Command::Help = *command {
        Args::clap().print_help()?;
        println!();
        return Ok(());
    }

    if let Command::Config { example: true } = *command {
        print!("{}", Config::example().as_toml());
        return Ok(());
    }

    let cfg = args.config()?;
    if log_enabled!(log::Level::Debug) {
        for line in format!("{:#?}", cfg.redacted()).lines() {
            debug!("{}", line);
        }
    }

    let driver = Driver::with_config(cfg)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match *command {
        Command::Ls { ref owner } => driver.ls(owner, &mut out),
        Command::Head { ref repo } => driver.head(repo, &mut out),
        Command::Rename {
            ref repo,
            ref new_name,
        } => driver.rename(repo, new_name, &mut out),
        Command::Create {
            ref repo,
            public,
            clone,
        } => driver.create(repo, public, clone, &mut out),
        Command::Delete { ref repo } => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            driver.delete(repo, &mut input, &mut out)
        }
        Command::Clone {
            ref repo,
            http,
            ref destdir,
        } => {
            let protocol = if http { Protocol::Https } else { Protocol::Ssh };
            driver.clone(repo, protocol, destdir.as_deref(), &mut out)
        }
        Command::Config { .. } => driver.show_config(false, &mut out),
        Command::Site => {
            let cwd = env::current_dir().context("Unable to find the current directory")?;
            let url = driver.site(&cwd, &mut out)?;
            webbrowser::open(&url).context("Unable to open a browser")?;
            Ok(())
        }
        Command::Info { ref repo } => {
            let cwd = env::current_dir().context("Unable to find the current directory")?;
            driver.info(repo.as_deref(), &cwd, &mut out)
        }
        Command::Help => Ok(()),
    }
}

/// Print a failed command's error the way every other line of output looks.
fn report(e: &Error, verbosity: u64) {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let ripio_error = e.iter_chain().find_map(|c| c.downcast_ref::<RipioError>());

    match ripio_error {
        Some(RipioError::MissingConfig(_)) => {
            let _ = write!(out, "{}", CONFIG_USAGE);
        }
        Some(err) => {
            let _ = writeln!(out, "- {}", err);
        }
        None => {
            let _ = writeln!(out, "- {}", e);
        }
    }

    if verbosity == 0 {
        let _ = writeln!(out, "Try 'ripio -v' for detail");
        return;
    }

    for cause in e.iter_chain().skip(1) {
        let _ = writeln!(out, "\tCaused By: {}", cause);
    }
}

/// Manage hosted git repositories.
///
/// General repository name format is 'site:owner/name', for example
/// 'github:twitter/wordpress' or 'gh:twitter/wordpress', and
/// 'bitbucket:paypal/example' or 'bb:paypal/example'. The site may be left
/// out of 'owner/name' when the config file lists the owner on one site only.
/// Bare names are completed against the workspaces in the config file.
#[derive(Debug, Clone, PartialEq, StructOpt)]
#[structopt(name = "ripio")]
struct Args {
    #[structopt(
        long = "config",
        default_value = "~/.config/ripio",
        help = "Alternate config file"
    )]
    config_file: String,
    #[structopt(
        short = "v",
        long = "verbosity",
        parse(from_occurrences),
        help = "Verbosity level (-v: INFO, -vv: DEBUG, -vvv: TRACE)"
    )]
    verbosity: u64,
    #[structopt(subcommand)]
    cmd: Option<Command>,
}

impl Args {
    pub fn config(&self) -> Result<Config, Error> {
        let config_file =
            shellexpand::full(&self.config_file).context("Unable to expand wildcards")?;

        Config::from_file(&*config_file).map_err(Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, StructOpt)]
enum Command {
    /// List the repositories of a workspace ('site:name')
    #[structopt(name = "ls")]
    Ls {
        #[structopt(help = "Team or user, as 'site:name' or a configured 'name'")]
        owner: String,
    },
    /// Show the last commits
    #[structopt(name = "head")]
    Head {
        #[structopt(help = "Repository reference (site:owner/slug) or name")]
        repo: String,
    },
    /// Rename a repository
    #[structopt(name = "rename")]
    Rename {
        #[structopt(help = "Repository reference (site:owner/slug) or name")]
        repo: String,
        #[structopt(name = "new-name", help = "New repository name")]
        new_name: String,
    },
    /// Create a new repository
    #[structopt(name = "create")]
    Create {
        #[structopt(help = "Repository reference (site:owner/slug)")]
        repo: String,
        #[structopt(long = "public", help = "Make the repository public")]
        public: bool,
        #[structopt(long = "clone", help = "Clone the new repository")]
        clone: bool,
    },
    /// Delete a repository
    #[structopt(name = "delete")]
    Delete {
        #[structopt(help = "Repository reference (site:owner/slug) or name")]
        repo: String,
    },
    /// Clone a repository
    #[structopt(name = "clone")]
    Clone {
        #[structopt(help = "Repository reference (site:owner/slug) or name")]
        repo: String,
        #[structopt(long = "http", help = "Use HTTPS instead of SSH")]
        http: bool,
        #[structopt(
            long = "destdir",
            parse(from_os_str),
            help = "Directory to clone into"
        )]
        destdir: Option<PathBuf>,
    },
    /// Show the config
    #[structopt(name = "config")]
    Config {
        #[structopt(long = "example", help = "Print an example config instead")]
        example: bool,
    },
    /// Open the web page of the repository in the current directory
    #[structopt(name = "site")]
    Site,
    /// Show repository info
    #[structopt(name = "info")]
    Info {
        #[structopt(help = "Repository reference (site:owner/slug) or name")]
        repo: Option<String>,
    },
    /// Show help
    #[structopt(name = "help")]
    Help,
}

fn initialize_logging(args: &Args) -> Result<(), Error> {
    let mut builder = Builder::new();

    let level = match args.verbosity {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };

    if let Some(lvl) = level {
        builder.filter(Some("ripio"), lvl);
    }

    if let Ok(filter) = env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    }

    builder.format(|out, record| match record.line() {
        Some(line) => writeln!(
            out,
            "{} [{:5}] ({}#{}): {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            line,
            record.args()
        ),
        None => writeln!(
            out,
            "{} [{:5}] ({}): {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        ),
    });

    builder.try_init()?;

    Ok(())
}
