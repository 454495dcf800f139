//! Style renderer: per-file CSS compilation
//!
//! Each matched stylesheet compiles independently through lightningcss,
//! then flows through up to three optional stages: vendor prefixing
//! (`autoprefixer`), minification (`minify`), and a source-map companion
//! per input (`map`). A parse error aborts the whole builder; broken
//! stylesheets are never silently skipped.

use super::sourcemap::SourceMapBuilder;
use super::{BuildError, TypeBuilder};
use crate::build::file::BuildFile;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

/// Compile every matched stylesheet, emitting the compiled file and, when
/// enabled, a `.map` companion (never revisioned).
pub(crate) fn render(
    builder: &TypeBuilder,
    files: Vec<BuildFile>,
) -> Result<Vec<BuildFile>, BuildError> {
    let prefix = builder.is_enabled("autoprefixer");
    let minify = builder.is_enabled("minify");
    let want_map = builder.is_enabled("map");

    let mut rendered = Vec::new();

    for mut file in files {
        let source_text = String::from_utf8_lossy(&builder.read_source(&file)?).into_owned();
        let source_name = file.source().to_string_lossy().into_owned();

        let css =
            compile(&source_text, &source_name, prefix, minify).map_err(BuildError::Render)?;
        file.buffer = css.into_bytes();

        let map_file = if want_map {
            let map_name = format!("{}.map", file.filename());

            let mut map = SourceMapBuilder::new(file.filename());
            let source_index = map.add_source(source_name, source_text);
            map.map_line(source_index, 0);

            file.buffer
                .extend_from_slice(format!("\n/*# sourceMappingURL={} */", map_name).as_bytes());

            Some(
                BuildFile::new(file.source().to_path_buf(), builder.destination().to_string())
                    .with_filename(map_name)
                    .with_buffer(map.build().into_bytes()),
            )
        } else {
            None
        };

        rendered.push(file);
        if let Some(map_file) = map_file {
            rendered.push(map_file);
        }
    }

    Ok(rendered)
}

/// Targets handed to the minifier and printer. With prefixing enabled, a
/// browser floor (versions encoded as `major << 16`) makes lightningcss
/// emit vendor prefixes.
fn targets(prefix: bool) -> Targets {
    if !prefix {
        return Targets::default();
    }

    Targets::from(Browsers {
        chrome: Some(90 << 16),
        edge: Some(90 << 16),
        firefox: Some(88 << 16),
        safari: Some(14 << 16),
        ios_saf: Some(14 << 16),
        ..Browsers::default()
    })
}

/// Run one stylesheet through parse, optional prefixing, and optional
/// minification. Errors are stringified since lightningcss errors borrow
/// the input.
fn compile(source: &str, filename: &str, prefix: bool, minify: bool) -> Result<String, String> {
    let mut stylesheet = StyleSheet::parse(
        source,
        ParserOptions { filename: filename.to_string(), ..ParserOptions::default() },
    )
    .map_err(|e| format!("{}: {}", filename, e))?;

    if minify {
        stylesheet
            .minify(MinifyOptions { targets: targets(prefix), ..MinifyOptions::default() })
            .map_err(|e| format!("{}: {}", filename, e))?;
    }

    let output = stylesheet
        .to_css(PrinterOptions { minify, targets: targets(prefix), ..PrinterOptions::default() })
        .map_err(|e| format!("{}: {}", filename, e))?;

    Ok(output.code)
}
