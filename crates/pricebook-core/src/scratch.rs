//! Request-scoped temporary storage.
//!
//! Everything written through a [`Scratch`] lives in one private temporary
//! directory that is removed when the guard is dropped, whichever way the
//! owning request ends.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new(prefix: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Creates `name` for reading and writing; fails if it already exists.
    pub fn create(&self, name: &str) -> io::Result<File> {
        File::options()
            .read(true)
            .write(true)
            .create_new(true)
            .open(self.file_path(name))
    }

    /// Removes the directory now, reporting failures instead of ignoring them.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}
