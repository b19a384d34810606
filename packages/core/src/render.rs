//! Text renderings of trees and directories.

use std::fs;
use std::path::Path;

use crate::tree::{NodeKind, Tree};
use crate::Result;

const BLANK: &str = "   ";
const PIPE: &str = "│  ";
const TEE: &str = "├──";
const ELBOW: &str = "└──";

impl Tree {
    /// Render the declared fields as a tree.
    ///
    /// With `details`, each line also shows the node's path and handler.
    /// Nested trees are expanded up to `max_depth` levels (all levels when
    /// `None`).
    pub fn render(&self, max_depth: Option<usize>, details: bool) -> String {
        let mut lines = Vec::new();
        self.render_into("", 1, max_depth, details, &mut lines);
        lines.join("\n")
    }

    fn render_into(
        &self,
        prefix: &str,
        depth: usize,
        max_depth: Option<usize>,
        details: bool,
        lines: &mut Vec<String>,
    ) {
        let longest = self.nodes().map(|node| node.name().chars().count()).max().unwrap_or(0);
        let count = self.len();

        for (i, node) in self.nodes().enumerate() {
            let last = i + 1 == count;
            let pointer = if last { ELBOW } else { TEE };

            let mut line = format!("{}{}{}", prefix, pointer, node.name());
            if details {
                let leader = "-".repeat(longest + 4 - node.name().chars().count());
                line.push_str(&format!(
                    " {} (path='{}', handler={})",
                    leader,
                    node.path(),
                    node.handler_name()
                ));
            }
            lines.push(line);

            if let NodeKind::Tree(subtree) = node.kind() {
                if max_depth.map_or(true, |max| depth < max) {
                    let extension = if last { BLANK } else { PIPE };
                    subtree.render_into(
                        &format!("{}{}", prefix, extension),
                        depth + 1,
                        max_depth,
                        details,
                        lines,
                    );
                }
            }
        }
    }
}

/// Render the contents of a directory on disk, entries sorted by name.
///
/// Useful for comparing what a tree declares with what is actually there.
pub fn render_dir(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut lines = vec![path.display().to_string()];
    render_dir_into(path, "", &mut lines)?;
    Ok(lines.join("\n"))
}

fn render_dir_into(path: &Path, prefix: &str, lines: &mut Vec<String>) -> Result<()> {
    let mut entries = fs::read_dir(path)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    let count = entries.len();
    for (i, entry) in entries.iter().enumerate() {
        let last = i + 1 == count;
        let pointer = if last { ELBOW } else { TEE };
        let name = entry
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        lines.push(format!("{}{}{}", prefix, pointer, name));

        if entry.is_dir() {
            let extension = if last { BLANK } else { PIPE };
            render_dir_into(entry, &format!("{}{}", prefix, extension), lines)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::handler::test_support::StringHandler;
    use crate::{FieldSpec, HandlerRef, HandlerSpec, Overrides, Registry, TreeType};

    fn sample() -> Tree {
        let mut registry = Registry::new();
        registry.register_default::<StringHandler>("string", &[".txt"]);

        let inner = TreeType::builder("Inner")
            .field("p", FieldSpec::new().path("p.txt"))
            .build()
            .unwrap();
        TreeType::builder("Sample")
            .field("alpha", FieldSpec::new().path("a.txt"))
            .field("inner", FieldSpec::new().path("sub").handler(inner))
            .field("z", FieldSpec::new().path("z.txt"))
            .build()
            .unwrap()
            .instantiate_with(&registry, Overrides::new())
            .unwrap()
    }

    #[test]
    fn render_without_details() {
        let expected = ["├──alpha", "├──inner", "│  └──p", "└──z"].join("\n");
        assert_eq!(sample().render(None, false), expected);
    }

    #[test]
    fn render_respects_max_depth() {
        let expected = ["├──alpha", "├──inner", "└──z"].join("\n");
        assert_eq!(sample().render(Some(1), false), expected);
    }

    #[test]
    fn render_with_details_aligns_leaders() {
        let rendered = sample().render(None, true);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines[0],
            "├──alpha ---- (path='a.txt', handler=StringHandler)"
        );
        assert_eq!(lines[1], "├──inner ---- (path='sub', handler=Inner)");
        assert_eq!(lines[2], "│  └──p ---- (path='p.txt', handler=StringHandler)");
        assert_eq!(lines[3], "└──z -------- (path='z.txt', handler=StringHandler)");
    }

    #[test]
    fn render_expands_trees_built_by_factories() {
        let mut registry = Registry::new();
        registry.register_default::<StringHandler>("string", &[".txt"]);
        let inner = TreeType::builder("Inner")
            .field("p", FieldSpec::new().path("p.txt"))
            .build()
            .unwrap()
            .instantiate_with(&registry, Overrides::new())
            .unwrap();

        let tree = TreeType::builder("Outer")
            .field(
                "inner",
                FieldSpec::new().path("sub").handler(HandlerSpec::factory(move || {
                    Arc::new(inner.clone()) as HandlerRef
                })),
            )
            .build()
            .unwrap()
            .instantiate_with(&registry, Overrides::new())
            .unwrap();
        assert_eq!(tree.render(None, false), "└──inner\n   └──p");
    }

    #[test]
    fn display_starts_with_type_name() {
        let shown = sample().to_string();
        assert!(shown.starts_with("Sample\n├──alpha"));
    }

    #[test]
    fn render_dir_lists_sorted_entries() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/p.txt"), "").unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();

        let rendered = render_dir(dir.path()).unwrap();
        let lines: Vec<&str> = rendered.lines().skip(1).collect();
        assert_eq!(lines, vec!["├──a.txt", "├──b.txt", "└──sub", "   └──p.txt"]);
    }
}
