//! Import sorting for the organize-imports code action.
//!
//!     A group is a run of consecutive lines whose trimmed text starts with `import `. Any other
//!     line, blank ones included, ends the group. Groups are sorted independently and never
//!     merged, so blank-line separated blocks keep their layout.

/// Replace the whole of `line` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEdit {
    pub line: u32,
    pub new_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ImportGroup<'a> {
    start_line: usize,
    imports: Vec<&'a str>,
}

fn is_import(line: &str) -> bool {
    line.trim().starts_with("import ")
}

fn import_groups(contents: &str) -> Vec<ImportGroup<'_>> {
    let mut groups = Vec::new();
    let mut current: Option<ImportGroup<'_>> = None;
    for (idx, line) in contents.split('\n').enumerate() {
        if is_import(line) {
            current
                .get_or_insert_with(|| ImportGroup {
                    start_line: idx,
                    imports: Vec::new(),
                })
                .imports
                .push(line);
        } else if let Some(group) = current.take() {
            groups.push(group);
        }
    }
    groups.extend(current);
    groups
}

/// Edits that sort every import group. Lines already in place produce no edit.
pub fn organize_imports(contents: &str) -> Vec<LineEdit> {
    let mut edits = Vec::new();
    for group in import_groups(contents) {
        let mut sorted = group.imports.clone();
        sorted.sort_unstable();
        for (offset, (original, replacement)) in group.imports.iter().zip(sorted).enumerate() {
            if *original != replacement {
                edits.push(LineEdit {
                    line: (group.start_line + offset) as u32,
                    new_text: replacement.to_string(),
                });
            }
        }
    }
    edits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(contents: &str, edits: &[LineEdit]) -> String {
        let mut lines: Vec<String> = contents.split('\n').map(str::to_string).collect();
        for edit in edits {
            lines[edit.line as usize] = edit.new_text.clone();
        }
        lines.join("\n")
    }

    #[test]
    fn sorts_each_group_independently() {
        let source = "package a\n\
                      import scala.util.Try\n\
                      import java.io.File\n\
                      \n\
                      import zio.ZIO\n\
                      import cats.Monad\n\
                      class A";
        let edits = organize_imports(source);
        assert_eq!(
            apply(source, &edits),
            "package a\n\
             import java.io.File\n\
             import scala.util.Try\n\
             \n\
             import cats.Monad\n\
             import zio.ZIO\n\
             class A"
        );
        assert_eq!(edits.len(), 4);
    }

    #[test]
    fn sorted_imports_need_no_edits() {
        assert!(organize_imports("import a.A\nimport b.B\n").is_empty());
        assert!(organize_imports("class NoImports").is_empty());
        assert!(organize_imports("").is_empty());
    }

    #[test]
    fn indented_imports_count_and_keep_their_indentation() {
        let source = "object O {\n  import z.Z\n  import a.A\n}";
        let edits = organize_imports(source);
        assert_eq!(
            edits,
            vec![
                LineEdit {
                    line: 1,
                    new_text: "  import a.A".to_string()
                },
                LineEdit {
                    line: 2,
                    new_text: "  import z.Z".to_string()
                },
            ]
        );
    }

    #[test]
    fn group_at_end_of_file_is_included() {
        let edits = organize_imports("class A\nimport b.B\nimport a.A");
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].line, 1);
    }

    #[test]
    fn identifiers_named_import_are_not_imports() {
        assert!(organize_imports("val importer = 1\nimportant()").is_empty());
    }
}
