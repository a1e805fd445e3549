//! Cursor-to-identifier resolution.
//!
//!     Columns are UTF-16 code units, the encoding LSP positions use by default. Only ASCII
//!     letters, digits and underscore count as identifier characters, so a term is always
//!     plain ASCII and its length in units equals its length in bytes.

use crate::symbol::symbol_name;

/// Inclusive character bounds on a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharRange {
    pub start: u32,
    pub end: u32,
}

impl CharRange {
    pub fn contains(&self, character: u32) -> bool {
        character >= self.start && character <= self.end
    }
}

/// The identifier under a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// Prefixed form, ready for index lookup.
    pub name: String,
    pub raw: String,
    pub range: CharRange,
}

impl Term {
    fn empty(character: u32) -> Self {
        Self {
            name: symbol_name(""),
            raw: String::new(),
            range: CharRange {
                start: character,
                end: character,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

pub fn is_term_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn is_term_unit(unit: u16) -> bool {
    unit < 0x80 && is_term_char(unit as u8 as char)
}

/// Find the maximal identifier span containing `character` on `line`.
pub fn scan_term(line: &str, character: u32) -> Term {
    let units: Vec<u16> = line.encode_utf16().collect();
    let cursor = character as usize;
    match units.get(cursor) {
        Some(unit) if is_term_unit(*unit) => {}
        _ => return Term::empty(character),
    }

    let mut start = cursor;
    while start > 0 && is_term_unit(units[start - 1]) {
        start -= 1;
    }
    let mut end = cursor;
    while end + 1 < units.len() && is_term_unit(units[end + 1]) {
        end += 1;
    }

    let raw: String = units[start..=end]
        .iter()
        .map(|unit| *unit as u8 as char)
        .collect();
    Term {
        name: symbol_name(&raw),
        raw,
        range: CharRange {
            start: start as u32,
            end: end as u32,
        },
    }
}
