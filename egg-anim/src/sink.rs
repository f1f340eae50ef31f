//! Output destinations for encoded animation text

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::ExportError;

/// Destination that receives one complete encoded animation
pub trait TextSink {
    fn write_text(&mut self, text: &str) -> Result<(), ExportError>;
}

/// Writes to a file, replacing any existing content
#[derive(Clone, Debug)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextSink for FileSink {
    fn write_text(&mut self, text: &str) -> Result<(), ExportError> {
        let failure = |source| ExportError::WriteFailure {
            path: self.path.clone(),
            source,
        };

        let file = File::create(&self.path).map_err(failure)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(text.as_bytes()).map_err(failure)?;
        writer.flush().map_err(failure)?;
        Ok(())
    }
}

/// Clipboard-like in-memory destination; each write replaces the content
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    contents: String,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn into_contents(self) -> String {
        self.contents
    }
}

impl TextSink for MemorySink {
    fn write_text(&mut self, text: &str) -> Result<(), ExportError> {
        self.contents.clear();
        self.contents.push_str(text);
        Ok(())
    }
}
