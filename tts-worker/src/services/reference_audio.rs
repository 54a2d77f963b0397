//! Turns a normalized reference clip into something the model can open.
//!
//! URLs pass through untouched. Inline clips are written to a uniquely named
//! `.wav` temp file owned by a [`TempAudioFile`] guard, which deletes the
//! file when dropped, whichever way the job ends.

use crate::services::normalizer::ReferenceAudio;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempPath};

const TEMP_PREFIX: &str = "ref-audio-";
const TEMP_SUFFIX: &str = ".wav";

/// Scoped owner of a decoded reference clip on disk.
#[derive(Debug)]
pub struct TempAudioFile {
    path: PathBuf,
    temp_path: Option<TempPath>,
}

impl TempAudioFile {
    fn new(temp_path: TempPath) -> Self {
        Self {
            path: temp_path.to_path_buf(),
            temp_path: Some(temp_path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempAudioFile {
    fn drop(&mut self) {
        let Some(temp_path) = self.temp_path.take() else {
            return;
        };
        let path = &self.path;

        match temp_path.close() {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Cleaned up temp file");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Temp file already removed");
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not clean up temp file"
                );
            }
        }
    }
}

/// Locator handed to the model plus the temp file backing it, if any.
#[derive(Debug, Default)]
pub struct MaterializedReference {
    locator: Option<String>,
    temp_file: Option<TempAudioFile>,
}

impl MaterializedReference {
    /// URL or file path for the model; `None` when no reference was given.
    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    pub fn temp_file(&self) -> Option<&TempAudioFile> {
        self.temp_file.as_ref()
    }
}

/// Writes inline reference clips to scoped temp files.
#[derive(Debug, Clone, Default)]
pub struct ReferenceAudioMaterializer {
    temp_dir: Option<PathBuf>,
}

impl ReferenceAudioMaterializer {
    /// `temp_dir` of `None` uses the system temp directory.
    pub fn new(temp_dir: Option<PathBuf>) -> Self {
        Self { temp_dir }
    }

    pub fn materialize(
        &self,
        reference: Option<&ReferenceAudio>,
    ) -> io::Result<MaterializedReference> {
        match reference {
            None => Ok(MaterializedReference::default()),
            Some(ReferenceAudio::Url(url)) => {
                tracing::info!("Using reference audio from URL");
                Ok(MaterializedReference {
                    locator: Some(url.clone()),
                    temp_file: None,
                })
            }
            Some(ReferenceAudio::Inline(bytes)) => {
                tracing::info!(bytes = bytes.len(), "Writing decoded reference audio");
                let temp_file = self.write_temp(bytes)?;
                Ok(MaterializedReference {
                    locator: Some(temp_file.path().to_string_lossy().into_owned()),
                    temp_file: Some(temp_file),
                })
            }
        }
    }

    fn write_temp(&self, bytes: &[u8]) -> io::Result<TempAudioFile> {
        let mut builder = Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(TEMP_SUFFIX);

        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;

        // Close the handle so the model can open the file by path.
        Ok(TempAudioFile::new(file.into_temp_path()))
    }
}
