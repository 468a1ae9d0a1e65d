use std::collections::BTreeMap;

use crate::archive::archive_plan;
use crate::{Error, Registry, ResolveContext, Result};

/// Shape of the files an update will install. Rebuilt from scratch for every
/// preview; carries no file data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Directory(BTreeMap<String, TreeNode>),
    Leaf,
}

impl Default for TreeNode {
    fn default() -> Self {
        TreeNode::Directory(BTreeMap::new())
    }
}

impl TreeNode {
    pub fn is_directory(&self) -> bool {
        matches!(self, TreeNode::Directory(_))
    }

    pub fn children(&self) -> Option<&BTreeMap<String, TreeNode>> {
        match self {
            TreeNode::Directory(children) => Some(children),
            TreeNode::Leaf => None,
        }
    }

    /// Inserts a file path. Intermediate directories are created as needed and
    /// inserting the same file twice is a no-op.
    pub fn insert_path(&mut self, path: &str) -> Result<()> {
        let segments = split_path(path);
        self.insert_segments(&segments)
            .map_err(|depth| Error::PathConflict {
                path: segments[..=depth].join("/"),
            })
    }

    /// On conflict returns the index of the segment that clashed.
    fn insert_segments(&mut self, segments: &[&str]) -> std::result::Result<(), usize> {
        let mut node = self;
        for (depth, segment) in segments.iter().enumerate() {
            let is_last = depth + 1 == segments.len();
            let TreeNode::Directory(children) = node else {
                return Err(depth.saturating_sub(1));
            };

            let child = children.entry((*segment).to_string()).or_insert_with(|| {
                if is_last {
                    TreeNode::Leaf
                } else {
                    TreeNode::default()
                }
            });

            if is_last && child.is_directory() {
                return Err(depth);
            }
            node = child;
        }
        Ok(())
    }

    pub fn contains_file(&self, path: &str) -> bool {
        let mut node = self;
        for segment in split_path(path) {
            match node.children().and_then(|children| children.get(segment)) {
                Some(child) => node = child,
                None => return false,
            }
        }
        matches!(node, TreeNode::Leaf)
    }

    pub fn file_count(&self) -> usize {
        match self {
            TreeNode::Leaf => 1,
            TreeNode::Directory(children) => children.values().map(TreeNode::file_count).sum(),
        }
    }

    /// Every file path in the tree, `/` joined and without a leading separator.
    pub fn file_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_paths(&mut Vec::new(), &mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, prefix: &mut Vec<&'a str>, out: &mut Vec<String>) {
        match self {
            TreeNode::Leaf => out.push(prefix.join("/")),
            TreeNode::Directory(children) => {
                for (name, child) in children {
                    prefix.push(name);
                    child.collect_paths(prefix, out);
                    prefix.pop();
                }
            }
        }
    }
}

/// Splits on `/`, dropping empty segments so stray leading, trailing or
/// doubled separators never create nameless folders. A `\` is part of the
/// file name.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Builds the preview tree for everything in `registry`. Uses the archive
/// plan, so it fails exactly when packing the same registry would.
pub fn build(registry: &Registry, context: &ResolveContext) -> Result<TreeNode> {
    let mut root = TreeNode::default();
    for entry in archive_plan(registry, context)? {
        root.insert_path(&entry.path)?;
    }
    Ok(root)
}
