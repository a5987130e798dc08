//! Prefix tree mapping document paths to subcolumns.

use rustc_hash::FxHashMap;

use crate::path::ColumnPath;
use crate::subcolumn::Subcolumn;

#[derive(Debug, Clone, Default)]
struct TreeNode {
    /// Children in first-insertion order; `index` maps segment names into it.
    children: Vec<(String, TreeNode)>,
    index: FxHashMap<String, usize>,
    subcolumn: Option<Subcolumn>,
}

impl TreeNode {
    fn child(&self, segment: &str) -> Option<&TreeNode> {
        self.index.get(segment).map(|&i| &self.children[i].1)
    }

    fn child_mut(&mut self, segment: &str) -> Option<&mut TreeNode> {
        let index = *self.index.get(segment)?;
        Some(&mut self.children[index].1)
    }

    fn child_or_insert(&mut self, segment: &str) -> &mut TreeNode {
        let index = match self.index.get(segment) {
            Some(&i) => i,
            None => {
                let i = self.children.len();
                self.children.push((segment.to_string(), TreeNode::default()));
                self.index.insert(segment.to_string(), i);
                i
            }
        };
        &mut self.children[index].1
    }
}

/// A path-indexed trie where any node may carry a subcolumn payload.
///
/// Interior nodes exist to host descendants; a path like `a` can hold a
/// payload even while `a.b` does too. Iteration order is stable between
/// calls: depth-first, with siblings in the order their nodes were first
/// created. Callers treat the order as opaque.
#[derive(Debug, Clone, Default)]
pub struct SubcolumnTree {
    root: TreeNode,
    num_subcolumns: usize,
}

impl SubcolumnTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of populated paths.
    pub fn len(&self) -> usize {
        self.num_subcolumns
    }

    pub fn is_empty(&self) -> bool {
        self.num_subcolumns == 0
    }

    pub fn contains(&self, path: &ColumnPath) -> bool {
        self.get(path).is_some()
    }

    pub fn get(&self, path: &ColumnPath) -> Option<&Subcolumn> {
        let mut node = &self.root;
        for segment in path.segments() {
            node = node.child(segment)?;
        }
        node.subcolumn.as_ref()
    }

    pub fn get_mut(&mut self, path: &ColumnPath) -> Option<&mut Subcolumn> {
        let mut node = &mut self.root;
        for segment in path.segments() {
            node = node.child_mut(segment)?;
        }
        node.subcolumn.as_mut()
    }

    /// Attaches a subcolumn at `path`, creating interior nodes as needed.
    /// Returns false when the path is empty or already populated.
    pub fn add(&mut self, path: ColumnPath, subcolumn: Subcolumn) -> bool {
        if path.is_empty() {
            return false;
        }
        let mut node = &mut self.root;
        for segment in path.segments() {
            node = node.child_or_insert(segment);
        }
        if node.subcolumn.is_some() {
            return false;
        }
        node.subcolumn = Some(subcolumn);
        self.num_subcolumns += 1;
        true
    }

    /// Removes the payload at `path`, pruning interior nodes that no longer
    /// host anything.
    pub fn erase(&mut self, path: &ColumnPath) -> Option<Subcolumn> {
        let removed = Self::erase_in(&mut self.root, path.segments());
        if removed.is_some() {
            self.num_subcolumns -= 1;
        }
        removed
    }

    fn erase_in(node: &mut TreeNode, segments: &[String]) -> Option<Subcolumn> {
        let Some((first, rest)) = segments.split_first() else {
            return node.subcolumn.take();
        };
        let child_index = *node.index.get(first)?;
        let removed = Self::erase_in(&mut node.children[child_index].1, rest)?;
        let child = &node.children[child_index].1;
        if child.subcolumn.is_none() && child.children.is_empty() {
            node.children.remove(child_index);
            node.index.remove(first);
            // Removal shifts every later child down one slot.
            for index in node.index.values_mut() {
                if *index > child_index {
                    *index -= 1;
                }
            }
        }
        Some(removed)
    }

    /// Populated paths in stable iteration order.
    pub fn paths(&self) -> Vec<ColumnPath> {
        self.leaves().into_iter().map(|(path, _)| path).collect()
    }

    pub fn leaves(&self) -> Vec<(ColumnPath, &Subcolumn)> {
        let mut out = Vec::with_capacity(self.num_subcolumns);
        let mut prefix = Vec::new();
        Self::collect(&self.root, &mut prefix, &mut out);
        out
    }

    fn collect<'a>(
        node: &'a TreeNode,
        prefix: &mut Vec<String>,
        out: &mut Vec<(ColumnPath, &'a Subcolumn)>,
    ) {
        if let Some(subcolumn) = &node.subcolumn {
            out.push((ColumnPath::from_segments(prefix.clone()), subcolumn));
        }
        for (segment, child) in &node.children {
            prefix.push(segment.clone());
            Self::collect(child, prefix, out);
            prefix.pop();
        }
    }

    pub fn leaves_mut(&mut self) -> Vec<(ColumnPath, &mut Subcolumn)> {
        let mut out = Vec::with_capacity(self.num_subcolumns);
        let mut prefix = Vec::new();
        Self::collect_mut(&mut self.root, &mut prefix, &mut out);
        out
    }

    fn collect_mut<'a>(
        node: &'a mut TreeNode,
        prefix: &mut Vec<String>,
        out: &mut Vec<(ColumnPath, &'a mut Subcolumn)>,
    ) {
        if let Some(subcolumn) = &mut node.subcolumn {
            out.push((ColumnPath::from_segments(prefix.clone()), subcolumn));
        }
        for (segment, child) in &mut node.children {
            prefix.push(segment.clone());
            Self::collect_mut(child, prefix, out);
            prefix.pop();
        }
    }
}
