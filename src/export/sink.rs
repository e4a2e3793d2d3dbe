use super::{Artifact, ExportError};
use std::fs;
use std::path::{Path, PathBuf};

/// Delivers an artifact to the user: a download, a response body, a file.
pub trait ExportSink {
    fn deliver(&mut self, artifact: &Artifact) -> Result<PathBuf, ExportError>;
}

/// Writes artifacts under a directory, named by their filename.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

fn write_error(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::Write {
        path: path.display().to_string(),
        source,
    }
}

impl ExportSink for DirectorySink {
    fn deliver(&mut self, artifact: &Artifact) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir).map_err(|e| write_error(&self.dir, e))?;

        let file_name = Path::new(&artifact.filename)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("export"));
        let path = self.dir.join(file_name);

        fs::write(&path, &artifact.bytes).map_err(|e| write_error(&path, e))?;
        tracing::debug!(path = %path.display(), mime = %artifact.mime_type, "delivered export");
        Ok(path)
    }
}
