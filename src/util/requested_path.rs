use std::path::{Component, Path, PathBuf};

#[inline]
pub(crate) fn decode_percents(string: &str) -> String {
    percent_encoding::percent_decode_str(string)
        .decode_utf8_lossy()
        .into_owned()
}

/// Whether any segment of the path, split on either kind of slash, is exactly `..`.
pub(crate) fn contains_dot_dot(path: &str) -> bool {
    if !path.contains("..") {
        return false;
    }
    path.split(['/', '\\']).any(|segment| segment == "..")
}

/// Lexically clean a rooted slash path.
///
/// Drops empty and `.` segments, lets `..` eat the previous segment (never climbing above
/// the root) and strips the trailing slash. The result always starts with `/`.
pub(crate) fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut cleaned = String::with_capacity(path.len() + 1);
    for segment in segments {
        cleaned.push('/');
        cleaned.push_str(segment);
    }
    if cleaned.is_empty() {
        cleaned.push('/');
    }
    cleaned
}

/// Request path mapped onto the filesystem below a root.
#[derive(Debug)]
pub(crate) struct RequestedPath {
    /// Root joined with the cleaned request path.
    pub full_path: PathBuf,
}

impl RequestedPath {
    /// Map a percent-decoded request path onto `root`.
    ///
    /// Returns `None` if the raw path contains a `..` segment, even one that cleaning would
    /// have made harmless.
    pub fn resolve(root: &Path, request_path: &str) -> Option<Self> {
        if contains_dot_dot(request_path) {
            return None;
        }

        let mut full_path = if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root.to_path_buf()
        };

        let rooted;
        let request_path = if request_path.starts_with('/') {
            request_path
        } else {
            rooted = format!("/{request_path}");
            &rooted
        };

        for segment in clean_path(request_path).split('/') {
            // Parse again to prevent a segment smuggling in a Windows drive letter or
            // prefix, e.g.: `/anypath/c:/windows/win.ini`
            if !segment.is_empty()
                && Path::new(segment)
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)))
            {
                full_path.push(segment);
            }
        }

        Some(RequestedPath { full_path })
    }
}
