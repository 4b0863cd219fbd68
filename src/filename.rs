//! Filename assignment for downloaded documents.
//!
//! Candidates come from the record title or, without one, a random token.
//! Paths are claimed with an exclusive create, so two writers can never end up
//! with the same file even when their candidates are identical.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tracing::debug;

use crate::error::UnpaywallError;
use crate::token::TokenSource;

/// Extension given to every downloaded document.
pub(crate) const DOCUMENT_EXTENSION: &str = ".pdf";

/// Longest stem kept from a title, in characters.
pub(crate) const MAX_STEM_CHARS: usize = 120;

/// Exclusive-create attempts before giving up on a directory.
pub(crate) const MAX_CREATE_ATTEMPTS: usize = 64;

/// Replaces every character outside `[A-Za-z0-9_]` with `_` and truncates.
///
/// Surrounding whitespace is not trimmed; it becomes `_` like any other
/// non-word character.
pub(crate) fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .take(MAX_STEM_CHARS)
        .collect()
}

/// Chooses the first filename stem for a record.
pub(crate) fn candidate_stem(title: Option<&str>, tokens: &TokenSource) -> String {
    match title.filter(|t| !t.trim().is_empty()) {
        Some(title) => sanitize_title(title),
        None => tokens.next_token(),
    }
}

/// Creates a new file under `dir` named after `stem`, extending the name with a
/// fresh token each time the candidate already exists.
///
/// Returns the open handle together with its path; the file is empty.
///
/// # Errors
///
/// Returns [`UnpaywallError::Io`] for any error other than an existing file,
/// and [`UnpaywallError::FilenameExhausted`] when every attempt collided.
pub(crate) async fn create_exclusive(
    dir: &Path,
    stem: &str,
    tokens: &TokenSource,
) -> Result<(File, PathBuf), UnpaywallError> {
    let mut candidate = dir.join(format!("{stem}{DOCUMENT_EXTENSION}"));

    for attempt in 1..=MAX_CREATE_ATTEMPTS {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(file) => {
                debug!(path = %candidate.display(), attempt, "reserved output path");
                return Ok((file, candidate));
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %candidate.display(), attempt, "output path taken");
                let token = tokens.next_token();
                candidate = dir.join(format!("{stem}_{token}{DOCUMENT_EXTENSION}"));
            }
            Err(err) => return Err(UnpaywallError::io(candidate, err)),
        }
    }

    Err(UnpaywallError::filename_exhausted(dir, MAX_CREATE_ATTEMPTS))
}
