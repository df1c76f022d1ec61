// Our basic error type.

use std::{error, fmt, result};

use codespan_reporting::{
    diagnostic::Diagnostic,
    term::{
        self,
        termcolor::{ColorChoice, StandardStream},
    },
};
use thiserror::Error;

use crate::known_files::{FileId, KnownFiles};

/// Our standard result type.
pub type Result<T, E = Error> = result::Result<T, E>;

/// Our standard error type.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An error occurred in schema source code supplied by the user.
    #[error(transparent)]
    Source(#[from] Box<SourceError>),

    /// Two or more definitions generated the same global name. The individual
    /// clashes have already been reported by the time we see this.
    NameClashes { count: usize },

    /// An error with extra context. We may replace this with more specific
    /// errors later.
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },

    /// An unknown error occurred.
    #[error(transparent)]
    Other(Box<dyn error::Error + Send + Sync + 'static>),
}

impl Error {
    /// Create a new `Error::NameClashes`.
    pub fn name_clashes(count: usize) -> Self {
        Error::NameClashes { count }
    }

    /// Create a new `Error::Other` from an error value.
    pub fn other<E>(e: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        Error::Other(Box::<E>::new(e))
    }

    /// Emit this error to stderr. This does extra formatting for `SourceError`,
    /// with colors and source code snippets.
    pub fn emit(&self, files: &KnownFiles) {
        match self {
            Error::Source(e) => {
                e.emit(files);
            }
            _ => {
                let mut messages = self.chain_messages().into_iter();
                if let Some(first) = messages.next() {
                    eprintln!("ERROR: {}", first);
                }
                for message in messages {
                    eprintln!("  caused by: {}", message);
                }
            }
        }
    }

    /// One message per error in the source chain, outermost first. Each
    /// message leaves out its causes, which get messages of their own.
    pub fn chain_messages(&self) -> Vec<String> {
        let mut messages = vec![];
        let mut next: Option<&(dyn error::Error + 'static)> = Some(self);
        while let Some(mut err) = next {
            while let Some(e @ (Error::Source(_) | Error::Other(_))) = as_our_error(err) {
                err = e.skip_transparent();
            }
            messages.push(match as_our_error(err) {
                Some(Error::Context { context, .. }) => context.clone(),
                _ => err.to_string(),
            });
            next = err.source();
        }
        messages
    }

    /// Skip "transparent" errors, like `Source` and `Other`.
    pub fn skip_transparent(&self) -> &(dyn error::Error + 'static) {
        match self {
            Error::Source(e) => e.as_ref(),
            Error::Other(e) => e.as_ref(),
            Error::NameClashes { .. } | Error::Context { .. } => self,
        }
    }
}

/// Is `err` one of ours, possibly boxed?
fn as_our_error<'a>(err: &'a (dyn error::Error + 'static)) -> Option<&'a Error> {
    err.downcast_ref::<Error>()
        .or_else(|| err.downcast_ref::<Box<Error>>().map(|e| e.as_ref()))
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // We include transparent errors here, in case someone prints them
        // without a full chain.
        match self {
            Error::Source(e) => write!(f, "{}", e),
            Error::NameClashes { count: 1 } => write!(f, "1 name clash detected"),
            Error::NameClashes { count } => write!(f, "{} name clashes detected", count),
            Error::Context { context, source } => write!(f, "{}: {}", context, source),
            Error::Other(e) => write!(f, "{}", e),
        }
    }
}

/// Format an error message.
macro_rules! format_err {
    ($($arg:tt)*) => {
        Error::Other(format!($($arg)*).into())
    };
}

// A trick to make `format_err!` accessible from within this crate.
pub(crate) use format_err;

/// Helper trait used
pub trait Context<T, E>: Sized {
    fn with_context<S, F>(self, context_fn: F) -> Result<T>
    where
        S: Into<String>,
        F: FnOnce() -> S,
    {
        self.context(context_fn())
    }

    fn context<S>(self, context: S) -> Result<T>
    where
        S: Into<String>;
}

impl<T, E> Context<T, E> for Result<T, E>
where
    E: error::Error + Send + Sync + 'static,
{
    fn context<S>(self, context: S) -> Result<T>
    where
        S: Into<String>,
    {
        self.map_err(|e| Error::Context {
            context: context.into(),
            source: Box::new(Error::other(e)),
        })
    }
}

/// A problem in a schema file, with a diagnostic pointing into the source.
#[derive(Debug)]
pub struct SourceError {
    pub source: peg::error::ParseError<peg::str::LineCol>,
    pub diagnostic: Diagnostic<FileId>,
}

impl SourceError {
    pub fn emit(&self, files: &KnownFiles) {
        emit_diagnostic(files, &self.diagnostic);
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parser error: expected {}", self.source)
    }
}

impl error::Error for SourceError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Print a diagnostic to stderr, with colors if the terminal supports them.
pub fn emit_diagnostic(files: &KnownFiles, diagnostic: &Diagnostic<FileId>) {
    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = term::Config::default();
    term::emit(&mut writer.lock(), &config, files, diagnostic).expect("could not write to stderr");
}
