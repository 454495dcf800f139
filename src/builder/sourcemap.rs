//! Source Map v3 generation for concatenated and compiled outputs
//!
//! Produces the minimal map shape the pipeline needs: one segment per
//! generated line, pointing at column 0 of a line in one of the inputs.
//! Mappings are base64 VLQ encoded per the Source Map revision 3 format.

use serde_json::json;

const BASE64_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Append the base64 VLQ encoding of a signed value.
fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq: u64 =
        if value < 0 { (((-value) as u64) << 1) | 1 } else { (value as u64) << 1 };

    loop {
        let mut digit = (vlq & 0b11111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(BASE64_CHARS[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Incrementally builds a Source Map v3 document.
#[derive(Debug)]
pub struct SourceMapBuilder {
    file: String,
    sources: Vec<String>,
    sources_content: Vec<String>,
    /// Per generated line: `(source_index, source_line)`, or None for an
    /// unmapped line
    lines: Vec<Option<(u32, u32)>>,
}

impl SourceMapBuilder {
    /// Start a map for the named generated file.
    pub fn new(file: impl Into<String>) -> Self {
        Self { file: file.into(), sources: Vec::new(), sources_content: Vec::new(), lines: Vec::new() }
    }

    /// Register an input file and its content, returning its index.
    pub fn add_source(&mut self, name: impl Into<String>, content: impl Into<String>) -> u32 {
        self.sources.push(name.into());
        self.sources_content.push(content.into());
        (self.sources.len() - 1) as u32
    }

    /// Map the next generated line to column 0 of a source line.
    pub fn map_line(&mut self, source_index: u32, source_line: u32) {
        self.lines.push(Some((source_index, source_line)));
    }

    /// Emit the next generated line with no mapping.
    pub fn skip_line(&mut self) {
        self.lines.push(None);
    }

    fn mappings(&self) -> String {
        let mut out = String::new();
        let mut prev_source: i64 = 0;
        let mut prev_line: i64 = 0;

        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                out.push(';');
            }

            if let Some((source, source_line)) = line {
                // [generated column, source index, source line, source column]
                encode_vlq(0, &mut out);
                encode_vlq(i64::from(*source) - prev_source, &mut out);
                encode_vlq(i64::from(*source_line) - prev_line, &mut out);
                encode_vlq(0, &mut out);

                prev_source = i64::from(*source);
                prev_line = i64::from(*source_line);
            }
        }

        out
    }

    /// Serialize the map as a JSON document.
    pub fn build(&self) -> String {
        json!({
            "version": 3,
            "file": self.file,
            "sources": self.sources,
            "sourcesContent": self.sources_content,
            "names": [],
            "mappings": self.mappings(),
        })
        .to_string()
    }
}
