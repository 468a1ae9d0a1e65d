use std::cmp::Ordering;
use std::fmt::Write;

use crate::TreeNode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    pub depth: usize,
    pub name: String,
    pub is_directory: bool,
}

/// Flattens `root` for display. At every level folders come first, then files,
/// each group in [`display_order`].
pub fn render(root: &TreeNode) -> Vec<TreeLine> {
    let mut lines = Vec::new();
    render_into(root, 0, &mut lines);
    lines
}

fn render_into(node: &TreeNode, depth: usize, lines: &mut Vec<TreeLine>) {
    let Some(children) = node.children() else {
        return;
    };

    let mut entries: Vec<_> = children.iter().collect();
    entries.sort_by(|(a_name, a), (b_name, b)| {
        b.is_directory()
            .cmp(&a.is_directory())
            .then_with(|| display_order(a_name, b_name))
    });

    for (name, child) in entries {
        lines.push(TreeLine {
            depth,
            name: name.clone(),
            is_directory: child.is_directory(),
        });
        render_into(child, depth + 1, lines);
    }
}

/// Case-insensitive comparison, lowercase first on ties, so `a.txt`, `B.txt`
/// and `b.txt` list the way a file browser shows them.
pub fn display_order(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));

    folded.then_with(|| {
        a.chars()
            .zip(b.chars())
            .find(|(x, y)| x != y)
            .map(|(x, y)| match (x.is_lowercase(), y.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => x.cmp(&y),
            })
            .unwrap_or(Ordering::Equal)
    })
}

/// Plain-text listing, two spaces of indent per level and a trailing `/` on folders.
pub fn render_text(root: &TreeNode) -> String {
    let mut out = String::new();
    for line in render(root) {
        let suffix = if line.is_directory { "/" } else { "" };
        let _ = writeln!(out, "{}{}{}", "  ".repeat(line.depth), line.name, suffix);
    }
    out
}
