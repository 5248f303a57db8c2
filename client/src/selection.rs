use std::path::{Path, PathBuf};

use bytes::Bytes;
use common::format_file_size;
use tracing::debug;

use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    pub content: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len() as u64,
            content,
        }
    }

    pub fn display_size(&self) -> String {
        format_file_size(self.size)
    }
}

/// Holds the file picked for the next upload.
#[derive(Debug, Default)]
pub struct FileSelectionManager {
    selected: Option<SelectedFile>,
    /// Path the file was read from, when it came from disk.
    input: Option<PathBuf>,
}

impl FileSelectionManager {
    /// Takes the first offered file and ignores the rest.
    /// Returns `None` (and changes nothing) when nothing was offered.
    pub fn select<I>(&mut self, files: I) -> Option<&SelectedFile>
    where
        I: IntoIterator<Item = SelectedFile>,
    {
        let file = files.into_iter().next()?;
        debug!(name = %file.name, size = file.size, "file selected");
        self.input = None;
        Some(&*self.selected.insert(file))
    }

    /// Reads a file from disk and selects it.
    pub async fn select_path(&mut self, path: &Path) -> Result<&SelectedFile> {
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!(path = %path.display(), size = content.len(), "file read");
        self.input = Some(path.to_path_buf());
        Ok(&*self.selected.insert(SelectedFile::new(name, content)))
    }

    /// Forgets the selection and the input path, so the same file can be picked again.
    pub fn clear(&mut self) {
        self.selected = None;
        self.input = None;
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn input(&self) -> Option<&Path> {
        self.input.as_deref()
    }
}
