use std::{
    env,
    ffi::OsStr,
    path::{Path, PathBuf},
};

use nix::unistd::{access, AccessFlags};

use crate::prelude::*;

/// An executable that was found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    name: String,
    path: PathBuf,
}

impl Program {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A fresh [`Command`] for this program, with no arguments yet.
    pub fn command(&self) -> Command {
        Command::new(&self.path)
    }

    pub fn with_args<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command().args(args)
    }
}

/// Ordered list of directories to search for executables.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    dirs: Vec<PathBuf>,
}

impl Registry {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Directories from a `PATH`-style string.
    pub fn from_search_path(search_path: &OsStr) -> Self {
        Self::new(env::split_paths(search_path))
    }

    /// Directories from this process's `PATH`. A missing `PATH` searches nothing.
    pub fn from_env() -> Self {
        env::var_os("PATH")
            .map(|path| Self::from_search_path(&path))
            .unwrap_or_default()
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Resolve `name` to an executable.
    ///
    /// - Absolute paths, `./`-prefixed paths and paths with several components
    ///   are checked as given.
    /// - A bare name is searched for in each directory, first match wins.
    pub fn lookup(&self, name: &str) -> Result<Program> {
        let not_found = || ShellfishError::CommandNotFound {
            name: name.to_owned(),
        };

        let path = Path::new(name);
        let mut components = path.components();
        let found = match (components.next(), components.next()) {
            (None, _) => None,
            (Some(single), None) if !path.is_absolute() && !name.starts_with("./") => {
                self.search(single.as_os_str())
            }
            _ => executable(path).then(|| path.to_owned()),
        };

        let path = found.ok_or_else(not_found)?;
        trace!(name, path = %path.display(), "resolved program");

        Ok(Program {
            name: name.to_owned(),
            path,
        })
    }

    fn search(&self, name: &OsStr) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| executable(candidate))
    }
}

/// Resolve `name` against this process's `PATH`.
pub fn lookup(name: &str) -> Result<Program> {
    Registry::from_env().lookup(name)
}

fn executable(path: &Path) -> bool {
    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}
