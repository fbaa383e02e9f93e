//! Blob stores for binaries and source maps.
//!
//! Blobs live in the Cauldron's working copy next to the document, under
//! `binaries/` and `sourcemaps/`, keyed by application, platform and version.
//! Storing a blob commits and pushes that one path right away, outside of any
//! pending document transaction: the blob can land even if the transaction is
//! later discarded.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::descriptor::VersionCoordinates;
use crate::document::describe;
use crate::error::{Error, Result};
use crate::repository::VersionedRepository;
use crate::schema::is_path_segment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    Binary,
    SourceMap,
}

impl BlobKind {
    fn directory(&self) -> &'static str {
        match self {
            BlobKind::Binary => "binaries",
            BlobKind::SourceMap => "sourcemaps",
        }
    }

    fn file_name(&self) -> &'static str {
        match self {
            BlobKind::Binary => "binary",
            BlobKind::SourceMap => "sourcemap.map",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            BlobKind::Binary => "binary",
            BlobKind::SourceMap => "source map",
        }
    }
}

/// A directory of blobs inside the Cauldron working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStore {
    kind: BlobKind,
}

impl FileStore {
    pub fn new(kind: BlobKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> BlobKind {
        self.kind
    }

    /// Path of a blob relative to the working copy root.
    ///
    /// Fails when the application or version name is not a single path
    /// segment, so a blob never lands outside its store directory.
    pub fn relative_path(&self, coords: VersionCoordinates<'_>) -> Result<PathBuf> {
        for (name, value) in [("name", coords.name), ("version", coords.version)] {
            if !is_path_segment(value) {
                return Err(Error::invalid(
                    name,
                    format!("'{}' cannot be used as a {} directory", value, self.kind.label()),
                ));
            }
        }
        Ok(Path::new(self.kind.directory())
            .join(coords.name)
            .join(coords.platform.as_str())
            .join(coords.version)
            .join(self.kind.file_name()))
    }

    /// Write `content` for `coords`, commit it and push it.
    ///
    /// Returns the blob path relative to the working copy root.
    pub fn store(
        &self,
        repo: &mut VersionedRepository,
        coords: VersionCoordinates<'_>,
        content: &[u8],
    ) -> Result<PathBuf> {
        let relative = self.relative_path(coords)?;
        repo.sync()?;
        let absolute = repo.path().join(&relative);
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("[blob] Writing {}", absolute.display());
        fs::write(&absolute, content)?;

        let message = format!("Add {} for {}", self.kind.label(), describe(coords));
        repo.publish_paths(&[relative.as_path()], &message)?;
        info!("[blob] Stored {} for {}", self.kind.label(), describe(coords));
        Ok(relative)
    }

    /// Content stored for `coords`.
    pub fn retrieve(
        &self,
        repo: &mut VersionedRepository,
        coords: VersionCoordinates<'_>,
    ) -> Result<Vec<u8>> {
        let relative = self.relative_path(coords)?;
        repo.sync()?;
        let absolute = repo.path().join(relative);
        if !absolute.is_file() {
            return Err(Error::not_found(format!(
                "{} for {}",
                self.kind.label(),
                describe(coords)
            )));
        }
        Ok(fs::read(absolute)?)
    }
}
