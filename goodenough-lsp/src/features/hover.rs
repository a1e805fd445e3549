//! Hover: a Markdown list of links to every declaration of the hovered name.

use goodenough_index::SymbolRecord;

/// One link per record, ordered by uri, then line, then character. Lines are one-based in the
/// label and the fragment, characters stay zero-based. `None` when nothing matched.
pub fn hover_markdown(records: &[SymbolRecord]) -> Option<String> {
    if records.is_empty() {
        return None;
    }
    let mut sorted: Vec<&SymbolRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        (a.uri().as_str(), a.location.line, a.location.character).cmp(&(
            b.uri().as_str(),
            b.location.line,
            b.location.character,
        ))
    });
    let lines: Vec<String> = sorted.into_iter().map(hover_line).collect();
    Some(lines.join("\n"))
}

fn hover_line(record: &SymbolRecord) -> String {
    let line = record.location.line + 1;
    let character = record.location.character;
    // Two trailing spaces force a Markdown line break.
    format!(
        "[{}:{line},{character}]({}#L{line},{character})  ",
        record.file.relative_path,
        record.uri()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use goodenough_index::extract::extract;
    use goodenough_index::testing::source_file;

    #[test]
    fn links_are_sorted_by_line_not_character() {
        let mut records = extract(&source_file("src/A.scala"), "    class Foo\nclass Foo");
        records.extend(extract(&source_file("lib/B.scala"), "object Foo"));

        let markdown = hover_markdown(&records).unwrap();
        assert_eq!(
            markdown,
            "[lib/B.scala:1,7](file:///lib/B.scala#L1,7)  \n\
             [src/A.scala:1,10](file:///src/A.scala#L1,10)  \n\
             [src/A.scala:2,6](file:///src/A.scala#L2,6)  "
        );
    }

    #[test]
    fn nothing_to_show_is_none() {
        assert!(hover_markdown(&[]).is_none());
    }
}
