//! Build file unit: rendered content plus output path computation
//!
//! A `BuildFile` carries one output's rendered bytes and knows where the
//! bytes go: `filename()` and `destination()` are pure functions of the
//! construction inputs, while the revisioned variant is finalized exactly
//! once from the rendered buffer. Builders finalize revisions strictly
//! after rendering; later buffer edits (reference rewriting) intentionally
//! leave the cached hash untouched.

use std::path::{Component, Path, PathBuf};

/// Number of hex characters of the content digest spliced into filenames.
const REVISION_HASH_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Revision {
    filename: String,
    destination: PathBuf,
}

/// One output file of a build: source identity, rendered buffer, and
/// computed (revisioned) destination.
#[derive(Debug, Clone)]
pub struct BuildFile {
    /// Matched path relative to the base source directory, or a synthetic
    /// name for combined outputs
    source: PathBuf,
    /// The build's configured destination (directory, or file-like path
    /// whose last segment contains a dot)
    build_destination: String,
    /// Explicit output filename, bypassing derivation
    filename_override: Option<String>,
    prefix: String,
    suffix: String,
    /// Collapse the source sub-path into the destination directory
    flatten: bool,
    enable_revision: bool,
    /// Rendered content
    pub buffer: Vec<u8>,
    revision: Option<Revision>,
}

impl BuildFile {
    /// Create a build file for a matched source path.
    pub fn new(source: impl Into<PathBuf>, build_destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            build_destination: build_destination.into(),
            filename_override: None,
            prefix: String::new(),
            suffix: String::new(),
            flatten: false,
            enable_revision: false,
            buffer: Vec::new(),
            revision: None,
        }
    }

    /// Set the rendered content.
    pub fn with_buffer(mut self, buffer: Vec<u8>) -> Self {
        self.buffer = buffer;
        self
    }

    /// Override the derived output filename.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename_override = Some(filename.into());
        self
    }

    /// Prepend a fragment to the derived filename.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Append a fragment between the stem and the extension.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Collapse the source directory structure into the destination.
    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    /// Enable content-hash revisioning for this file.
    pub fn with_revision(mut self, enable: bool) -> Self {
        self.enable_revision = enable;
        self
    }

    /// The matched source path this file was built from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Whether revisioning was requested for this file.
    pub fn revision_enabled(&self) -> bool {
        self.enable_revision
    }

    /// Whether a path's last segment names a file (contains a dot).
    fn names_file(path: &str) -> bool {
        Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().contains('.'))
            .unwrap_or(false)
    }

    /// Output basename: `prefix + stem + suffix + extension`, derived from
    /// the build destination when it names a file, else from the source.
    pub fn filename(&self) -> String {
        if let Some(name) = &self.filename_override {
            return name.clone();
        }

        let basis: &Path = if Self::names_file(&self.build_destination) {
            Path::new(&self.build_destination)
        } else {
            &self.source
        };

        let stem = basis.file_stem().and_then(|s| s.to_str()).unwrap_or_default();

        match basis.extension().and_then(|s| s.to_str()) {
            Some(ext) => format!("{}{}{}.{}", self.prefix, stem, self.suffix, ext),
            None => format!("{}{}{}", self.prefix, stem, self.suffix),
        }
    }

    /// Source path segments between the matched root and the file, minus
    /// the first segment. Preserves structure under the source tree.
    fn source_subpath(&self) -> PathBuf {
        let mut segments: Vec<Component<'_>> =
            self.source.components().collect();
        segments.pop(); // the filename itself

        segments.into_iter().skip(1).collect()
    }

    /// Output path relative to the environment root.
    ///
    /// Pure: calling this any number of times yields the same path.
    pub fn destination(&self) -> PathBuf {
        let directory = if Self::names_file(&self.build_destination) {
            Path::new(&self.build_destination)
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default()
        } else {
            let mut directory = PathBuf::from(&self.build_destination);
            if !self.flatten {
                directory.push(self.source_subpath());
            }
            directory
        };

        directory.join(self.filename())
    }

    /// Compute and cache the revisioned filename/destination from the
    /// current buffer. A second call is a no-op; callers that mutate the
    /// buffer afterwards keep the hash of the pre-mutation content.
    pub fn finalize_revision(&mut self) {
        if !self.enable_revision || self.revision.is_some() {
            return;
        }

        let digest = format!("{:x}", md5::compute(&self.buffer));
        let hash = &digest[..REVISION_HASH_LEN];

        let filename = self.filename();
        // The hash lands immediately before the first dot, so
        // `app.min.js` revisions to `app.<hash>.min.js`. A name with no
        // dot stays as-is.
        let revisioned = match filename.find('.') {
            Some(index) => {
                format!("{}.{}.{}", &filename[..index], hash, &filename[index + 1..])
            }
            None => filename.clone(),
        };

        let destination = self.destination();
        let directory = destination.parent().map(Path::to_path_buf).unwrap_or_default();

        self.revision =
            Some(Revision { destination: directory.join(&revisioned), filename: revisioned });
    }

    /// The revisioned basename, once finalized.
    pub fn revisioned_filename(&self) -> Option<&str> {
        self.revision.as_ref().map(|r| r.filename.as_str())
    }

    /// The revisioned output path, once finalized.
    pub fn revisioned_destination(&self) -> Option<&Path> {
        self.revision.as_ref().map(|r| r.destination.as_path())
    }

    /// Where the buffer is written: the revisioned destination when one
    /// was finalized, the plain destination otherwise.
    pub fn write_destination(&self) -> PathBuf {
        self.revisioned_destination().map(Path::to_path_buf).unwrap_or_else(|| self.destination())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_source() {
        let file = BuildFile::new("img/icons/check.png", "assets");
        assert_eq!(file.filename(), "check.png");
    }

    #[test]
    fn test_filename_from_file_like_destination() {
        let file = BuildFile::new("js/a.js", "js/bundle.js");
        assert_eq!(file.filename(), "bundle.js");
    }

    #[test]
    fn test_filename_prefix_suffix() {
        let file = BuildFile::new("css/site.css", "styles")
            .with_prefix("v2-")
            .with_suffix(".bundle");
        assert_eq!(file.filename(), "v2-site.bundle.css");
    }

    #[test]
    fn test_filename_override_wins() {
        let file = BuildFile::new("js/a.js", "js/bundle.js").with_filename("bundle.js.map");
        assert_eq!(file.filename(), "bundle.js.map");
    }

    #[test]
    fn test_filename_without_extension() {
        let file = BuildFile::new("misc/LICENSE", "legal");
        assert_eq!(file.filename(), "LICENSE");
    }

    #[test]
    fn test_destination_preserves_subpath() {
        let file = BuildFile::new("img/icons/social/tw.png", "assets");
        assert_eq!(file.destination(), PathBuf::from("assets/icons/social/tw.png"));
    }

    #[test]
    fn test_destination_top_level_source() {
        let file = BuildFile::new("favicon.ico", "assets");
        assert_eq!(file.destination(), PathBuf::from("assets/favicon.ico"));
    }

    #[test]
    fn test_destination_flatten_collapses_subpath() {
        let file = BuildFile::new("img/icons/social/tw.png", "assets").with_flatten(true);
        assert_eq!(file.destination(), PathBuf::from("assets/tw.png"));
    }

    #[test]
    fn test_destination_file_like_uses_parent() {
        let file = BuildFile::new("js/vendor/lib.js", "js/bundle.js");
        assert_eq!(file.destination(), PathBuf::from("js/bundle.js"));
    }

    #[test]
    fn test_destination_empty_build_destination() {
        let file = BuildFile::new("img/logo.png", "");
        assert_eq!(file.destination(), PathBuf::from("logo.png"));
    }

    #[test]
    fn test_destination_is_deterministic() {
        let file = BuildFile::new("img/icons/check.png", "assets");
        assert_eq!(file.destination(), file.destination());
        assert_eq!(file.filename(), file.filename());
    }

    #[test]
    fn test_revision_disabled_by_default() {
        let mut file = BuildFile::new("img/logo.png", "assets").with_buffer(b"png".to_vec());
        file.finalize_revision();
        assert!(file.revisioned_filename().is_none());
        assert!(file.revisioned_destination().is_none());
        assert_eq!(file.write_destination(), PathBuf::from("assets/logo.png"));
    }

    #[test]
    fn test_revision_hash_before_first_dot() {
        let mut file = BuildFile::new("js/app.min.js", "js")
            .with_revision(true)
            .with_buffer(b"var a = 1;".to_vec());
        file.finalize_revision();

        let digest = format!("{:x}", md5::compute(b"var a = 1;"));
        let expected = format!("app.{}.min.js", &digest[..16]);
        assert_eq!(file.revisioned_filename(), Some(expected.as_str()));
        assert_eq!(file.write_destination(), PathBuf::from("js").join(expected));
    }

    #[test]
    fn test_revision_deterministic_and_content_sensitive() {
        let mut a = BuildFile::new("css/site.css", "css")
            .with_revision(true)
            .with_buffer(b"body{}".to_vec());
        let mut b = a.clone();
        a.finalize_revision();
        b.finalize_revision();
        assert_eq!(a.revisioned_filename(), b.revisioned_filename());

        let mut c = BuildFile::new("css/site.css", "css")
            .with_revision(true)
            .with_buffer(b"body{ }".to_vec());
        c.finalize_revision();
        assert_ne!(a.revisioned_filename(), c.revisioned_filename());
    }

    #[test]
    fn test_revision_cached_across_buffer_mutation() {
        let mut file = BuildFile::new("css/site.css", "css")
            .with_revision(true)
            .with_buffer(b"url(logo.png)".to_vec());
        file.finalize_revision();
        let before = file.revisioned_filename().unwrap().to_string();

        // Reference rewriting mutates the buffer after revisioning
        file.buffer = b"url(logo.abcdef.png)".to_vec();
        file.finalize_revision();
        assert_eq!(file.revisioned_filename(), Some(before.as_str()));
    }

    #[test]
    fn test_revision_dotless_filename_unchanged() {
        let mut file = BuildFile::new("misc/LICENSE", "legal")
            .with_revision(true)
            .with_buffer(b"MIT".to_vec());
        file.finalize_revision();
        assert_eq!(file.revisioned_filename(), Some("LICENSE"));
        assert_eq!(file.write_destination(), PathBuf::from("legal/LICENSE"));
    }
}
