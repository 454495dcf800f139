//! Pass-through renderer: source bytes become the output buffer as-is.

use super::{BuildError, TypeBuilder};
use crate::build::file::BuildFile;

/// Read every matched file's raw bytes into its buffer, unmodified.
pub(crate) fn render(
    builder: &TypeBuilder,
    mut files: Vec<BuildFile>,
) -> Result<Vec<BuildFile>, BuildError> {
    for file in &mut files {
        file.buffer = builder.read_source(file)?;
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildSpec, BuilderType, SourceList};
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_copy_preserves_bytes() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("misc")).unwrap();
        fs::write(temp.path().join("misc/data.bin"), [0u8, 159, 146, 150]).unwrap();

        let builder = TypeBuilder::new(
            "copy",
            BuildSpec {
                builder: BuilderType::Copy,
                source: SourceList::Single("misc/*".to_string()),
                destination: "out".to_string(),
                options: BTreeMap::new(),
                watch: vec![],
            },
            "development",
            temp.path(),
        );

        let files = builder.run().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].buffer, vec![0u8, 159, 146, 150]);
        assert_eq!(files[0].destination(), std::path::PathBuf::from("out/data.bin"));
    }

    #[test]
    fn test_copy_missing_source_is_io_error() {
        let temp = TempDir::new().unwrap();
        let builder = TypeBuilder::new(
            "copy",
            BuildSpec {
                builder: BuilderType::Copy,
                source: SourceList::Single("misc/*".to_string()),
                destination: "out".to_string(),
                options: BTreeMap::new(),
                watch: vec![],
            },
            "development",
            temp.path(),
        );

        // A file constructed outside resolve_sources with no backing file
        let phantom = BuildFile::new("misc/ghost.txt", "out");
        let result = render(&builder, vec![phantom]);
        assert!(matches!(result, Err(BuildError::Io(_))));
    }
}
