use mime_guess::{Mime, MimeGuess};
use std::fs::Metadata;
use std::io::{Error as IoError, ErrorKind as IoErrorKind};
use std::path::Path;
use tokio::fs::{self, File};

/// The result of `resolve_file`.
///
/// Covers all the possible 'normal' scenarios encountered when serving a file.
#[derive(Debug)]
pub enum ResolveResult {
    /// The requested file does not exist.
    NotFound,
    /// The requested file could not be accessed.
    PermissionDenied,
    /// A directory was requested as a file.
    IsDirectory,
    /// The requested file was found.
    Found(File, Metadata, Mime),
}

/// Some IO errors are expected when serving files, and mapped to a regular result here.
fn map_open_err(err: IoError) -> Result<ResolveResult, IoError> {
    match err.kind() {
        // A path component is a regular file, e.g. `/app.js/extra`.
        IoErrorKind::NotFound | IoErrorKind::NotADirectory => Ok(ResolveResult::NotFound),
        IoErrorKind::PermissionDenied => Ok(ResolveResult::PermissionDenied),
        _ => Err(err),
    }
}

/// Open a regular file, reporting whether it turned out to be a directory instead.
async fn open_with_metadata(path: &Path) -> Result<Option<(File, Metadata)>, IoError> {
    let metadata = fs::metadata(path).await?;
    if metadata.is_dir() {
        return Ok(None);
    }
    let file = File::open(path).await?;
    Ok(Some((file, metadata)))
}

/// Resolve a filesystem path to an open file.
///
/// If the path is a directory and `is_dir_request` is set (the request URL ended in a slash),
/// the `index_file_name` inside that directory is served instead. A directory without such an
/// index is treated as not found; directories are never listed.
///
/// The returned future may error for unexpected IO errors, passing on the `std::io::Error`.
/// Certain expected IO errors are handled, though, and simply reflected in the result. These are
/// `NotFound` and `PermissionDenied`.
pub async fn resolve_file(
    path: &Path,
    is_dir_request: bool,
    index_file_name: &str,
) -> Result<ResolveResult, IoError> {
    match open_with_metadata(path).await {
        Ok(Some((file, metadata))) => {
            let mime = MimeGuess::from_path(path).first_or_octet_stream();
            return Ok(ResolveResult::Found(file, metadata, mime));
        }
        Ok(None) if !is_dir_request => return Ok(ResolveResult::IsDirectory),
        Ok(None) => {}
        Err(err) => return map_open_err(err),
    }

    // Resolve the directory index.
    let index_path = path.join(index_file_name);
    match open_with_metadata(&index_path).await {
        Ok(Some((file, metadata))) => {
            let mime = MimeGuess::from_path(&index_path).first_or_octet_stream();
            Ok(ResolveResult::Found(file, metadata, mime))
        }
        // The directory index cannot itself be a directory.
        Ok(None) => Ok(ResolveResult::NotFound),
        Err(err) => map_open_err(err),
    }
}
