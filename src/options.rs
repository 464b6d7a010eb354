/// File served for the SPA entry route, and for directory requests.
pub const DEFAULT_INDEX_FILE_NAME: &str = "index.html";

/// File served, with status `404`, for paths that do not exist under the root.
pub const DEFAULT_NOT_FOUND_FILE_NAME: &str = "404.html";

/// File names used by the handlers, relative to their root.
///
/// With the `serde` feature enabled this can be read straight from host configuration; missing
/// fields fall back to their defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct SpaOptions {
    /// Name of the SPA entry page. Defaults to `index.html`.
    pub index_file_name: String,
    /// Name of the page served for unknown paths. Defaults to `404.html`.
    pub not_found_file_name: String,
}

impl Default for SpaOptions {
    fn default() -> Self {
        Self {
            index_file_name: DEFAULT_INDEX_FILE_NAME.to_owned(),
            not_found_file_name: DEFAULT_NOT_FOUND_FILE_NAME.to_owned(),
        }
    }
}

impl SpaOptions {
    /// Create options with the default file names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different entry page.
    pub fn index_file_name(&mut self, value: impl Into<String>) -> &mut Self {
        self.index_file_name = value.into();
        self
    }

    /// Use a different not-found page.
    pub fn not_found_file_name(&mut self, value: impl Into<String>) -> &mut Self {
        self.not_found_file_name = value.into();
        self
    }
}
