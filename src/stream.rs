//! Standard stream endpoints and their resolution into spawn-time [`Stdio`].

use std::{
    fmt,
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
};

use strum::{Display, EnumString};

use crate::prelude::*;

/// Which of the three standard streams an endpoint is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Input,
    Output,
    Error,
}

/// How an output file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
pub enum FileMode {
    #[default]
    #[strum(serialize = "w")]
    Truncate,
    #[strum(serialize = "a")]
    Append,
}

/// In-memory content fed to a process as its entire standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Bytes(Vec<u8>),
    Text(String),
}

impl Literal {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Text(text) => text.as_bytes(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&[u8]> for Literal {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Literal {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[derive(Debug, Default)]
pub enum Endpoint {
    /// Use the parent's stream.
    #[default]
    Inherit,
    /// Create a pipe the caller (or the execution driver) can read or write.
    Pipe,
    /// The null device.
    Null,
    /// A path opened when the statement runs.
    File { path: PathBuf, mode: FileMode },
    /// A file the caller already holds open. The child gets a duplicate.
    Handle(Arc<File>),
    /// Heredoc input.
    Literal(Literal),
    /// An already-realised stream, consumed by the next run.
    Stream(Stdio),
}

impl Endpoint {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            mode: FileMode::Truncate,
        }
    }

    pub fn append(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            mode: FileMode::Append,
        }
    }

    pub fn literal(content: impl Into<Literal>) -> Self {
        Self::Literal(content.into())
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /// A second endpoint writing to the same place, for statements that hand
    /// one error stream to several processes.
    ///
    /// Files come back in append mode: the first process to open the file
    /// applies the requested mode, later ones must not truncate it again.
    /// Literals and realised streams cannot be shared.
    pub fn share(&self) -> Option<Self> {
        match self {
            Self::Inherit => Some(Self::Inherit),
            Self::Pipe => Some(Self::Pipe),
            Self::Null => Some(Self::Null),
            Self::File { path, .. } => Some(Self::append(path.clone())),
            Self::Handle(file) => Some(Self::Handle(Arc::clone(file))),
            Self::Literal(_) | Self::Stream(_) => None,
        }
    }

    /// Turn this endpoint into the [`Stdio`] handed to the spawned child.
    ///
    /// Files are opened here, not when the endpoint is set. A [`Endpoint::Stream`]
    /// is moved out and the endpoint falls back to [`Endpoint::Inherit`].
    pub fn resolve(&mut self, role: Role) -> Result<Stdio> {
        match self {
            Self::Inherit => Ok(Stdio::inherit()),
            Self::Pipe => Ok(Stdio::piped()),
            Self::Null => Ok(Stdio::null()),
            Self::File { path, mode } => open(path, *mode, role)
                .map(Stdio::from)
                .map_err(|source| ShellfishError::StreamResolution {
                    target: path.display().to_string(),
                    source,
                }),
            Self::Handle(file) => file.try_clone().map(Stdio::from).map_err(|source| {
                ShellfishError::StreamResolution {
                    target: format!("<{role} handle>"),
                    source,
                }
            }),
            Self::Literal(_) if role == Role::Input => Ok(Stdio::piped()),
            Self::Literal(_) => Err(ShellfishError::StreamResolution {
                target: format!("<{role} literal>"),
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "literal data can only be used as standard input",
                ),
            }),
            Self::Stream(_) => match std::mem::take(self) {
                Self::Stream(stdio) => Ok(stdio),
                _ => unreachable!(),
            },
        }
    }

    /// Shell-style rendering of a redirection, if this endpoint is one.
    pub(crate) fn redirection(&self, role: Role) -> Option<String> {
        let fd = match role {
            Role::Input => "<",
            Role::Output => ">",
            Role::Error => "2>",
        };
        match self {
            Self::Null => Some(format!("{fd} /dev/null")),
            Self::File { path, mode } => {
                let op = match (role, mode) {
                    (Role::Input, _) => "<".to_owned(),
                    (_, FileMode::Append) => format!("{fd}>"),
                    (_, FileMode::Truncate) => fd.to_owned(),
                };
                Some(format!("{op} {}", path.display()))
            }
            Self::Literal(_) if role == Role::Input => Some("<<< ...".to_owned()),
            _ => None,
        }
    }
}

impl From<Literal> for Endpoint {
    fn from(value: Literal) -> Self {
        Self::Literal(value)
    }
}

impl From<PathBuf> for Endpoint {
    fn from(value: PathBuf) -> Self {
        Self::file(value)
    }
}

impl From<&Path> for Endpoint {
    fn from(value: &Path) -> Self {
        Self::file(value)
    }
}

impl From<File> for Endpoint {
    fn from(value: File) -> Self {
        Self::Handle(Arc::new(value))
    }
}

impl From<Arc<File>> for Endpoint {
    fn from(value: Arc<File>) -> Self {
        Self::Handle(value)
    }
}

impl From<Stdio> for Endpoint {
    fn from(value: Stdio) -> Self {
        Self::Stream(value)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Self::Text(text) => f.write_str(text),
        }
    }
}

fn open(path: &Path, mode: FileMode, role: Role) -> io::Result<File> {
    if role == Role::Input {
        return File::open(path);
    }

    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        FileMode::Truncate => options.write(true).truncate(true),
        FileMode::Append => options.append(true),
    };
    options.open(path)
}

#[cfg(test)]
mod tests {
    use std::{io::Read, str::FromStr};

    use super::*;

    #[test]
    fn file_mode_parses_short_form() {
        assert_eq!(FileMode::from_str("w").unwrap(), FileMode::Truncate);
        assert_eq!(FileMode::from_str("a").unwrap(), FileMode::Append);
        assert!(FileMode::from_str("x").is_err());
        assert_eq!(FileMode::Append.to_string(), "a");
    }

    #[test]
    fn missing_input_file_fails_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let mut endpoint = Endpoint::file(dir.path().join("missing.txt"));

        let err = endpoint.resolve(Role::Input).unwrap_err();
        assert!(matches!(err, ShellfishError::StreamResolution { .. }));
    }

    #[test]
    fn output_file_is_created_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let mut endpoint = Endpoint::file(&path);
        assert!(!path.exists());

        endpoint.resolve(Role::Output).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn truncate_clears_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "old").unwrap();

        Endpoint::file(&path).resolve(Role::Output).unwrap();

        let mut content = String::new();
        File::open(&path).unwrap().read_to_string(&mut content).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn literal_is_rejected_on_output() {
        let mut endpoint = Endpoint::literal("data");
        assert!(endpoint.resolve(Role::Input).is_ok());
        assert!(matches!(
            endpoint.resolve(Role::Output),
            Err(ShellfishError::StreamResolution { .. })
        ));
    }

    #[test]
    fn stream_is_consumed_once() {
        let mut endpoint = Endpoint::from(Stdio::null());
        endpoint.resolve(Role::Input).unwrap();
        assert!(matches!(endpoint, Endpoint::Inherit));
    }

    #[test]
    fn handle_resolution_leaves_caller_handle_open() {
        let file = Arc::new(tempfile::tempfile().unwrap());
        let mut endpoint = Endpoint::Handle(Arc::clone(&file));

        endpoint.resolve(Role::Output).unwrap();
        drop(endpoint);

        assert!(file.metadata().is_ok());
    }

    #[test]
    fn shared_file_appends() {
        let shared = Endpoint::file("err.log").share().unwrap();
        assert!(matches!(
            shared,
            Endpoint::File {
                mode: FileMode::Append,
                ..
            }
        ));
        assert!(Endpoint::literal("x").share().is_none());
    }

    #[test]
    fn redirections_render_like_a_shell() {
        assert_eq!(
            Endpoint::append("log.txt").redirection(Role::Error).as_deref(),
            Some("2>> log.txt")
        );
        assert_eq!(
            Endpoint::file("in.txt").redirection(Role::Input).as_deref(),
            Some("< in.txt")
        );
        assert_eq!(Endpoint::Pipe.redirection(Role::Output), None);
    }
}
