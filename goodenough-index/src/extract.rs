//! Declaration extraction by line-oriented pattern matching.
//!
//!     Each keyword has one pattern of the shape `keyword (<letter><word-char>+)`. The patterns
//!     are unanchored and applied to every line independently, so declarations inside comments
//!     or strings are found too, and so is `class Foo` inside `subclass Foo`. Identifiers shorter
//!     than two characters never match.
//!
//!     The identifier column is computed as `match start + keyword length + 1`, which assumes a
//!     single space between keyword and identifier. A declaration written with more whitespace
//!     does not match the pattern at all.

use crate::files::FileEntry;
use crate::symbol::{symbol_name, DeclarationKind, SourceFile, SymbolLocation, SymbolRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Keywords in extraction order.
pub const DECLARATION_KEYWORDS: [(&str, DeclarationKind); 6] = [
    ("class", DeclarationKind::Class),
    ("trait", DeclarationKind::Interface),
    ("object", DeclarationKind::Class),
    ("val", DeclarationKind::Variable),
    ("def", DeclarationKind::Function),
    ("type", DeclarationKind::TypeParameter),
];

struct DeclarationPattern {
    keyword: &'static str,
    kind: DeclarationKind,
    regex: Regex,
}

static DECLARATION_PATTERNS: Lazy<Vec<DeclarationPattern>> = Lazy::new(|| {
    DECLARATION_KEYWORDS
        .iter()
        .map(|(keyword, kind)| DeclarationPattern {
            keyword,
            kind: *kind,
            regex: Regex::new(&format!("{keyword} ([a-zA-Z][a-zA-Z0-9_]+)")).unwrap(),
        })
        .collect()
});

/// Extract every declaration in `contents`, attributing them to `file`.
pub fn extract(file: &Arc<SourceFile>, contents: &str) -> Vec<SymbolRecord> {
    let lines: Vec<&str> = contents.split('\n').collect();
    let mut records = Vec::new();
    for pattern in DECLARATION_PATTERNS.iter() {
        let offset = pattern.keyword.len() as u32 + 1;
        for (line_number, line) in lines.iter().enumerate() {
            for found in pattern.regex.find_iter(line) {
                let Some(identifier) = found.as_str().get(offset as usize..) else {
                    continue;
                };
                records.push(SymbolRecord {
                    name: symbol_name(identifier),
                    raw_name: identifier.to_string(),
                    kind: pattern.kind,
                    file: Arc::clone(file),
                    location: SymbolLocation::new(
                        line_number as u32,
                        utf16_column(line, found.start()) + offset,
                    ),
                });
            }
        }
    }
    records
}

/// Extract declarations from many files, in file order.
pub fn extract_files<'a, I>(files: I) -> Vec<SymbolRecord>
where
    I: IntoIterator<Item = &'a FileEntry>,
{
    files
        .into_iter()
        .flat_map(|entry| extract(&Arc::new(entry.source_file()), &entry.contents))
        .collect()
}

fn utf16_column(line: &str, byte_offset: usize) -> u32 {
    if line.is_ascii() {
        byte_offset as u32
    } else {
        line[..byte_offset].encode_utf16().count() as u32
    }
}
