//! File discovery: enumerates the source files a run will analyze.
//!
//! The walk honors an extension allowlist plus directory and filename
//! exclusion sets, skips hidden directories, and returns entries in a
//! stable sorted order so downstream batch planning is deterministic.

use crate::batch::Payload;
use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub size: u64,
    pub extension: String,
}

impl SourceFile {
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    /// Contents as UTF-8, or `None` for binary/unreadable files; those are
    /// skipped, not fatal.
    pub fn read_contents(&self) -> Option<String> {
        match std::fs::read(&self.path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Some(text),
                Err(_) => {
                    debug!(path = %self.path.display(), "skipping non-UTF-8 file");
                    None
                }
            },
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "skipping unreadable file");
                None
            }
        }
    }
}

impl Payload for SourceFile {
    fn payload_size(&self) -> u64 {
        self.size
    }
}

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub allowed_extensions: HashSet<String>,
    pub excluded_dirs: HashSet<String>,
    /// Substring patterns; a filename containing any of them is skipped.
    pub excluded_file_patterns: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        let allowed_extensions = [
            // Frontend
            "js", "jsx", "ts", "tsx", "vue", "html", "css", "scss", "sass",
            // Backend
            "py", "java", "php", "go", "rb", "cs", "cpp", "c", "h", "rs", "swift",
            // Configuration
            "json", "yml", "yaml", "xml", "env", "config",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let excluded_dirs = [
            "node_modules",
            "__pycache__",
            "venv",
            "env",
            "dist",
            "build",
            "coverage",
            "target",
            "bin",
            "obj",
            "vendor",
            "bower_components",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let excluded_file_patterns = [
            ".min.js",
            ".min.css",
            ".map",
            ".lock",
            "package-lock.json",
            "yarn.lock",
            "Pipfile.lock",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            allowed_extensions,
            excluded_dirs,
            excluded_file_patterns,
        }
    }
}

pub fn collect_files(root: &Path, config: &DiscoveryConfig) -> Result<Vec<SourceFile>> {
    if !root.exists() {
        anyhow::bail!("directory not found: {}", root.display());
    }

    let mut files = Vec::new();

    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if !entry.file_type().is_dir() {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        let hidden = name.starts_with('.') && entry.depth() > 0;
        !hidden && !config.excluded_dirs.contains(name.as_ref())
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "walk error");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if config
            .excluded_file_patterns
            .iter()
            .any(|pattern| name.contains(pattern.as_str()))
        {
            continue;
        }

        let extension = entry
            .path()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !config.allowed_extensions.contains(&extension) {
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        files.push(SourceFile {
            path: entry.path().to_path_buf(),
            size,
            extension,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    info!(count = files.len(), root = %root.display(), "discovered source files");

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_honors_allowlist_and_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        fs::write(root.join("app.py"), "print('hi')").unwrap();
        fs::write(root.join("index.js"), "console.log('hi')").unwrap();
        fs::write(root.join("app.min.js"), "minified").unwrap();
        fs::write(root.join("notes.txt"), "not code").unwrap();
        fs::create_dir(root.join("node_modules")).unwrap();
        fs::write(root.join("node_modules").join("dep.js"), "ignored").unwrap();

        let files = collect_files(root, &DiscoveryConfig::default()).unwrap();
        let names: Vec<String> = files.iter().map(|f| f.display_name()).collect();

        assert_eq!(names, vec!["app.py", "index.js"]);
    }

    #[test]
    fn test_missing_root_errors() {
        let result = collect_files(Path::new("/nonexistent/kasane-test"), &DiscoveryConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_binary_contents_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.py");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x41]).unwrap();

        let file = SourceFile {
            path,
            size: 4,
            extension: "py".to_string(),
        };
        assert!(file.read_contents().is_none());
    }
}
