//! Content sources: resolves globs against the file system and reads the
//! matched files into [`SourceText`]s for the pipeline.

use crate::errors::{GeneratorError, Result};
use crate::tokenizer::SourceText;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Security configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Maximum file size in bytes (default: 10MB)
    pub max_file_size: u64,
    /// Allow symbolic links
    pub allow_symlinks: bool,
    /// Symlink targets must stay inside this directory
    pub working_directory: PathBuf,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            allow_symlinks: false,
            working_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

/// A content file selected for scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Check if a file is safe to read
fn validate_input_file(path: &Path, security: &SecurityConfig) -> Result<u64> {
    if path.is_symlink() {
        if !security.allow_symlinks {
            return Err(GeneratorError::SecurityError(format!(
                "Symbolic link not allowed: {}",
                path.display()
            )));
        }

        let target = fs::canonicalize(path).map_err(|e| {
            GeneratorError::SecurityError(format!(
                "Cannot resolve symlink target for '{}': {}",
                path.display(),
                e
            ))
        })?;
        let working_dir = security
            .working_directory
            .canonicalize()
            .unwrap_or_else(|_| security.working_directory.clone());

        if !target.starts_with(&working_dir) {
            return Err(GeneratorError::SecurityError(format!(
                "Symlink target '{}' is outside working directory",
                target.display()
            )));
        }
    }

    let metadata = fs::metadata(path).map_err(|e| {
        GeneratorError::SecurityError(format!(
            "Cannot read file metadata for '{}': {}",
            path.display(),
            e
        ))
    })?;

    if metadata.len() > security.max_file_size {
        return Err(GeneratorError::SecurityError(format!(
            "File '{}' exceeds maximum size limit ({} MB > {} MB)",
            path.display(),
            metadata.len() / (1024 * 1024),
            security.max_file_size / (1024 * 1024)
        )));
    }

    Ok(metadata.len())
}

/// Check if a path should be excluded
fn should_exclude(path: &Path, exclude_patterns: &[glob::Pattern]) -> bool {
    exclude_patterns.iter().any(|pattern| pattern.matches_path(path))
}

/// Expand content globs into a deduplicated file list.
///
/// Files failing the security checks are skipped with a warning. An empty
/// result is an error.
pub fn collect_files<S: AsRef<str>>(
    patterns: &[S],
    exclude_patterns: &[String],
    security: &SecurityConfig,
) -> Result<Vec<ContentFile>> {
    let excludes = exclude_patterns
        .iter()
        .map(|p| glob::Pattern::new(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut files = Vec::new();
    let mut seen = HashSet::new();
    let mut skipped_count = 0;

    for pattern in patterns {
        for entry in glob::glob(pattern.as_ref())? {
            let path = entry?;

            if path.is_dir() || should_exclude(&path, &excludes) {
                continue;
            }

            let size = match validate_input_file(&path, security) {
                Ok(size) => size,
                Err(e) => {
                    tracing::warn!("Skipping file - {}", e);
                    skipped_count += 1;
                    continue;
                }
            };

            if seen.insert(path.clone()) {
                files.push(ContentFile { path, size });
            }
        }
    }

    if skipped_count > 0 {
        tracing::warn!(skipped = skipped_count, "Skipped files due to security constraints");
    }

    if files.is_empty() {
        return Err(GeneratorError::NoFilesFound);
    }

    Ok(files)
}

/// Read files in parallel. `on_read` is called once per file, from worker threads.
pub fn read_sources<F>(files: &[ContentFile], on_read: F) -> Result<Vec<SourceText>>
where
    F: Fn(&Path) + Sync,
{
    files
        .par_iter()
        .map(|file| {
            let content = fs::read(&file.path).map_err(|e| GeneratorError::InputError(format!(
                "Failed to read {}: {}",
                file.path.display(),
                e
            )))?;
            on_read(&file.path);
            Ok(SourceText::new(file.path.display().to_string(), content))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn security_for(dir: &TempDir) -> SecurityConfig {
        SecurityConfig {
            working_directory: dir.path().to_path_buf(),
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn test_collect_deduplicates_overlapping_globs() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.html"), "flex").unwrap();
        fs::write(dir.path().join("b.go"), "p-4").unwrap();

        let patterns = vec![
            format!("{}/*.html", dir.path().display()),
            format!("{}/*", dir.path().display()),
        ];
        let files = collect_files(&patterns, &[], &security_for(&dir)).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files[0].path.ends_with("a.html"));
    }

    #[test]
    fn test_collect_applies_excludes_and_skips_dirs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("keep.html"), "flex").unwrap();
        fs::write(dir.path().join("skip.html"), "flex").unwrap();

        let patterns = vec![format!("{}/*", dir.path().display())];
        let excludes = vec!["*/skip.html".to_string()];
        let files = collect_files(&patterns, &excludes, &security_for(&dir)).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("keep.html"));
    }

    #[test]
    fn test_collect_skips_oversized_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("big.html"), "a".repeat(2048)).unwrap();
        fs::write(dir.path().join("small.html"), "flex").unwrap();

        let security = SecurityConfig {
            max_file_size: 1024,
            ..security_for(&dir)
        };
        let patterns = vec![format!("{}/*.html", dir.path().display())];
        let files = collect_files(&patterns, &[], &security).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("small.html"));
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_rejects_symlinks_by_default() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real.html");
        fs::write(&real, "flex").unwrap();
        std::os::unix::fs::symlink(&real, dir.path().join("link.html")).unwrap();

        let patterns = vec![format!("{}/*.html", dir.path().display())];
        let files = collect_files(&patterns, &[], &security_for(&dir)).unwrap();
        assert_eq!(files.len(), 1);

        let permissive = SecurityConfig {
            allow_symlinks: true,
            ..security_for(&dir)
        };
        let files = collect_files(&patterns, &[], &permissive).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_no_files_found() {
        let dir = TempDir::new().unwrap();
        let patterns = vec![format!("{}/*.html", dir.path().display())];

        let err = collect_files(&patterns, &[], &security_for(&dir)).unwrap_err();
        assert!(matches!(err, GeneratorError::NoFilesFound));
    }

    #[test]
    fn test_invalid_pattern() {
        let dir = TempDir::new().unwrap();
        let err = collect_files(&["[invalid glob"], &[], &security_for(&dir)).unwrap_err();
        assert!(matches!(err, GeneratorError::Pattern(_)));
    }

    #[test]
    fn test_read_sources() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.html"), "<p class=\"text-lg\">").unwrap();

        let patterns = vec![format!("{}/*.html", dir.path().display())];
        let files = collect_files(&patterns, &[], &security_for(&dir)).unwrap();
        let counter = std::sync::atomic::AtomicUsize::new(0);
        let sources = read_sources(&files, |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        })
        .unwrap();

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].content, b"<p class=\"text-lg\">".to_vec());
        assert_eq!(counter.into_inner(), 1);
    }
}
