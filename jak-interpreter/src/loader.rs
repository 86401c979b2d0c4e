use std::collections::HashMap;
use std::io;

/// Supplies source text for `use "<path>"` statements. Paths are passed
/// through untouched; loaders do no caching or cycle detection.
pub trait SourceLoader {
    fn load(&self, path: &str) -> io::Result<String>;
}

/// Rejects every import.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLoader;

impl SourceLoader for NoLoader {
    fn load(&self, path: &str) -> io::Result<String> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("imports are not available here ({})", path),
        ))
    }
}

/// Serves sources from memory, keyed by path.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, source: impl Into<String>) -> Self {
        self.files.insert(path.into(), source.into());
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &str) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}
