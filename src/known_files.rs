//! Tracking of schema source files, so that we can have pretty errors.

use core::fmt;
use std::{
    fs,
    path::{Display as PathDisplay, Path, PathBuf},
};

use codespan_reporting::files::{Error as FilesError, Files, SimpleFile};

use crate::errors::{Context, Result};

/// A file identifier.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FileId(usize);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// All the schema files we know about.
///
/// **You should only create one copy of this per compilation run**, and share
/// it for every module you parse. Diagnostics only carry a [`FileId`], and do
/// not know which `KnownFiles` they came from.
#[derive(Debug, Default)]
pub struct KnownFiles {
    files: Vec<FileInfo>,
}

impl KnownFiles {
    /// Create a new [`KnownFiles`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path to the set of known files.
    pub fn add(&mut self, path: impl Into<PathBuf>) -> Result<FileId> {
        let path = path.into();
        let source = fs::read_to_string(&path)
            .with_context(|| format!("could not read file `{}`", path.display()))?;
        Ok(self.push(path, source))
    }

    /// Add a string to the set of known files. Mostly used from tests.
    #[allow(dead_code)]
    pub fn add_string(&mut self, path: impl Into<PathBuf>, source: &str) -> FileId {
        self.push(path.into(), source.to_owned())
    }

    fn push(&mut self, path: PathBuf, source: String) -> FileId {
        let file = SimpleFile::new("", source);
        let file_id = FileId(self.files.len());
        self.files.push(FileInfo { path, file });
        file_id
    }

    /// The path a file was loaded from.
    pub fn path(&self, id: FileId) -> Result<&Path> {
        Ok(&self
            .get_helper(id)
            .context("could not find schema file")?
            .path)
    }

    /// Get the schema source code for a file.
    pub fn source_code(&self, id: FileId) -> Result<&str> {
        self.source(id).context("could not get schema source code")
    }

    /// Look up a file by ID.
    fn get_helper(&self, id: FileId) -> Result<&FileInfo, FilesError> {
        self.files.get(id.0).ok_or(FilesError::FileMissing)
    }
}

impl<'a> Files<'a> for KnownFiles {
    type FileId = FileId;

    type Name = PathDisplay<'a>;

    type Source = &'a str;

    fn name(&'a self, id: Self::FileId) -> Result<Self::Name, FilesError> {
        Ok(self.get_helper(id)?.path.display())
    }

    fn source(&'a self, id: Self::FileId) -> Result<Self::Source, FilesError> {
        Ok(self.get_helper(id)?.file.source().as_ref())
    }

    fn line_index(&'a self, id: Self::FileId, byte_index: usize) -> Result<usize, FilesError> {
        self.get_helper(id)?.file.line_index((), byte_index)
    }

    fn line_range(
        &'a self,
        id: Self::FileId,
        line_index: usize,
    ) -> Result<std::ops::Range<usize>, FilesError> {
        self.get_helper(id)?.file.line_range((), line_index)
    }
}

/// Information we know about a file.
#[derive(Debug)]
struct FileInfo {
    /// The location of the file on disk.
    path: PathBuf,
    /// We re-use this because it implements [`Files::line_index`] and
    /// [`Files::line_range`] for us. We don't use the path in it.
    file: SimpleFile<&'static str, String>,
}
