//! Script renderer: many-to-one concatenation with optional minification
//!
//! Every matched file is folded into a single output keyed by the build's
//! configured destination. Minification is conservative: comments are
//! stripped and lines trimmed, but line structure is preserved, which
//! keeps the optional source map accurate at line granularity.

use super::sourcemap::SourceMapBuilder;
use super::{BuildError, TypeBuilder};
use crate::build::file::BuildFile;
use std::path::Path;

/// Concatenate all matched sources into one output file, with an optional
/// `.map` companion (never revisioned).
pub(crate) fn render(
    builder: &TypeBuilder,
    files: Vec<BuildFile>,
) -> Result<Vec<BuildFile>, BuildError> {
    if files.is_empty() {
        return Ok(vec![]);
    }

    let destination = builder.destination();
    let output_name = Path::new(destination)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| destination.to_string());
    let map_name = format!("{}.map", output_name);

    let minify = builder.is_enabled("minify");
    let want_map = builder.is_enabled("map");

    let mut combined = String::new();
    let mut map = SourceMapBuilder::new(&output_name);

    for file in &files {
        let text = String::from_utf8_lossy(&builder.read_source(file)?).into_owned();
        let source_index = map.add_source(file.source().to_string_lossy(), text.as_str());

        let lines: Vec<(u32, String)> = if minify {
            minify_lines(&text)
        } else {
            text.lines().enumerate().map(|(i, line)| (i as u32, line.to_string())).collect()
        };

        for (source_line, content) in lines {
            if !combined.is_empty() {
                combined.push('\n');
            }
            combined.push_str(&content);
            map.map_line(source_index, source_line);
        }
    }

    if want_map {
        combined.push('\n');
        combined.push_str(&format!("//# sourceMappingURL={}", map_name));
        map.skip_line();
    }

    let mut rendered = vec![BuildFile::new(destination, destination)
        .with_revision(builder.is_enabled("revision"))
        .with_buffer(combined.into_bytes())];

    if want_map {
        rendered.push(
            BuildFile::new(map_name.clone(), destination)
                .with_filename(map_name)
                .with_buffer(map.build().into_bytes()),
        );
    }

    Ok(rendered)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    Str(char),
    Template,
    BlockComment,
}

/// Strip comments and surrounding whitespace, keeping `(source_line,
/// content)` pairs for surviving lines. String and template literals are
/// honored; template literal lines keep their whitespace.
fn minify_lines(source: &str) -> Vec<(u32, String)> {
    let mut out = Vec::new();
    let mut state = ScanState::Code;

    for (index, line) in source.lines().enumerate() {
        let started_in_template = state == ScanState::Template;
        let mut kept = String::new();
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            match state {
                ScanState::BlockComment => {
                    if c == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        state = ScanState::Code;
                    }
                }
                ScanState::Str(delimiter) => {
                    kept.push(c);
                    if c == '\\' {
                        if let Some(escaped) = chars.next() {
                            kept.push(escaped);
                        }
                    } else if c == delimiter {
                        state = ScanState::Code;
                    }
                }
                ScanState::Template => {
                    kept.push(c);
                    if c == '\\' {
                        if let Some(escaped) = chars.next() {
                            kept.push(escaped);
                        }
                    } else if c == '`' {
                        state = ScanState::Code;
                    }
                }
                ScanState::Code => match c {
                    '/' if chars.peek() == Some(&'/') => break,
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        state = ScanState::BlockComment;
                    }
                    '"' | '\'' => {
                        kept.push(c);
                        state = ScanState::Str(c);
                    }
                    '`' => {
                        kept.push(c);
                        state = ScanState::Template;
                    }
                    _ => kept.push(c),
                },
            }
        }

        // Plain strings don't continue across lines
        if matches!(state, ScanState::Str(_)) {
            state = ScanState::Code;
        }

        let in_template = started_in_template || state == ScanState::Template;
        let content = if in_template { kept } else { kept.trim().to_string() };

        if in_template || !content.is_empty() {
            out.push((index as u32, content));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildSpec, BuilderType, OptionValue, SourceList};
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn scripts_builder(
        dir: &Path,
        options: BTreeMap<String, OptionValue>,
        environment: &str,
    ) -> TypeBuilder {
        TypeBuilder::new(
            "scripts",
            BuildSpec {
                builder: BuilderType::Scripts,
                source: SourceList::Single("js/*.js".to_string()),
                destination: "js/app.js".to_string(),
                options,
                watch: vec![],
            },
            environment,
            dir,
        )
    }

    fn no_extras() -> BTreeMap<String, OptionValue> {
        BTreeMap::from([
            ("minify".to_string(), OptionValue::from(false)),
            ("map".to_string(), OptionValue::from(false)),
        ])
    }

    #[test]
    fn test_concat_in_declaration_order() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("js")).unwrap();
        fs::write(temp.path().join("js/a.js"), "var a = 1;\n").unwrap();
        fs::write(temp.path().join("js/b.js"), "var b = 2;\n").unwrap();

        let builder = scripts_builder(temp.path(), no_extras(), "development");
        let files = builder.run().unwrap();

        assert_eq!(files.len(), 1);
        let code = String::from_utf8(files[0].buffer.clone()).unwrap();
        assert_eq!(code, "var a = 1;\nvar b = 2;");
        assert_eq!(files[0].destination(), Path::new("js/app.js"));
    }

    #[test]
    fn test_no_sources_yields_no_output() {
        let temp = TempDir::new().unwrap();
        let builder = scripts_builder(temp.path(), no_extras(), "development");
        let files = builder.run().unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_map_companion_emitted() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("js")).unwrap();
        fs::write(temp.path().join("js/a.js"), "var a = 1;\n").unwrap();

        let options =
            BTreeMap::from([("map".to_string(), OptionValue::from(true))]);
        let builder = scripts_builder(temp.path(), options, "development");
        let files = builder.run().unwrap();

        assert_eq!(files.len(), 2);

        let code = String::from_utf8(files[0].buffer.clone()).unwrap();
        assert!(code.ends_with("//# sourceMappingURL=app.js.map"));

        assert_eq!(files[1].filename(), "app.js.map");
        assert_eq!(files[1].destination(), Path::new("js/app.js.map"));
        assert!(!files[1].revision_enabled());

        let map: serde_json::Value = serde_json::from_slice(&files[1].buffer).unwrap();
        assert_eq!(map["version"], 3);
        assert_eq!(map["sources"][0], "js/a.js");
    }

    #[test]
    fn test_combined_output_revisions_as_one() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("js")).unwrap();
        fs::write(temp.path().join("js/a.js"), "var a = 1;\n").unwrap();

        // revision defaults to "production"
        let builder = scripts_builder(temp.path(), BTreeMap::new(), "production");
        let files = builder.run().unwrap();

        let revisioned = files[0].revisioned_filename().unwrap();
        assert!(revisioned.starts_with("app."));
        assert!(revisioned.ends_with(".js"));
    }

    #[test]
    fn test_minify_strips_comments_and_blank_lines() {
        let lines = minify_lines(
            "// header\nvar a = 1;  \n\n/* block\n   comment */\nvar b = 2;\n",
        );
        assert_eq!(
            lines,
            vec![(1, "var a = 1;".to_string()), (5, "var b = 2;".to_string())]
        );
    }

    #[test]
    fn test_minify_keeps_slashes_in_strings() {
        let lines = minify_lines("var url = \"https://example.com\"; // trailing\n");
        assert_eq!(lines, vec![(0, "var url = \"https://example.com\";".to_string())]);
    }

    #[test]
    fn test_minify_block_comment_inline() {
        let lines = minify_lines("var a /* inline */ = 1;\n");
        assert_eq!(lines, vec![(0, "var a  = 1;".to_string())]);
    }

    #[test]
    fn test_minify_preserves_template_literal_lines() {
        let lines = minify_lines("var t = `line one\n  indented line`;\n");
        assert_eq!(
            lines,
            vec![
                (0, "var t = `line one".to_string()),
                (1, "  indented line`;".to_string())
            ]
        );
    }
}
