//! Symbol records produced by the extractor and stored in the index.

use lsp_types::{SymbolKind, Url};
use std::fmt;
use std::sync::Arc;

/// Marker prepended to every identifier used as an index key.
pub const SYMBOL_PREFIX: &str = "__SCALA_SYMBOL__";

/// Build the index key for a raw identifier.
pub fn symbol_name(raw: &str) -> String {
    format!("{SYMBOL_PREFIX}{raw}")
}

/// Declaration kinds recognised by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Class,
    Interface,
    Variable,
    Function,
    TypeParameter,
}

impl DeclarationKind {
    pub fn to_lsp(self) -> SymbolKind {
        match self {
            DeclarationKind::Class => SymbolKind::CLASS,
            DeclarationKind::Interface => SymbolKind::INTERFACE,
            DeclarationKind::Variable => SymbolKind::VARIABLE,
            DeclarationKind::Function => SymbolKind::FUNCTION,
            DeclarationKind::TypeParameter => SymbolKind::TYPE_PARAMETER,
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeclarationKind::Class => "class",
            DeclarationKind::Interface => "interface",
            DeclarationKind::Variable => "variable",
            DeclarationKind::Function => "function",
            DeclarationKind::TypeParameter => "type",
        };
        f.write_str(label)
    }
}

/// The file a symbol was declared in. Shared between all records of a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    pub uri: Url,
    pub relative_path: String,
}

/// Zero-based position of the first identifier character, in UTF-16 units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolLocation {
    pub line: u32,
    pub character: u32,
}

impl SymbolLocation {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// One declaration site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolRecord {
    pub name: String,
    pub raw_name: String,
    pub kind: DeclarationKind,
    pub file: Arc<SourceFile>,
    pub location: SymbolLocation,
}

impl SymbolRecord {
    pub fn uri(&self) -> &Url {
        &self.file.uri
    }

    /// Ordering key shared by every index bucket: uri, then character, then line.
    pub(crate) fn index_order(&self) -> (&str, u32, u32) {
        (
            self.file.uri.as_str(),
            self.location.character,
            self.location.line,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_carry_the_prefix() {
        assert_eq!(symbol_name("toString"), "__SCALA_SYMBOL__toString");
        assert_ne!(symbol_name("constructor"), "constructor");
    }

    #[test]
    fn kinds_map_onto_lsp_vocabulary() {
        assert_eq!(DeclarationKind::Class.to_lsp(), SymbolKind::CLASS);
        assert_eq!(DeclarationKind::Interface.to_lsp(), SymbolKind::INTERFACE);
        assert_eq!(
            DeclarationKind::TypeParameter.to_lsp(),
            SymbolKind::TYPE_PARAMETER
        );
    }
}
