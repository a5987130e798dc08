//! The dynamic object column.
//!
//! An [`ObjectColumn`] stores a batch of semi-structured documents in
//! decomposed form: every document path becomes a subcolumn in a prefix
//! tree, and every subcolumn is kept rectangular with the row counter by
//! inserting defaults into paths a given row does not mention. The column is
//! an ingest-side structure; once [`ObjectColumn::finalize`]d it is collapsed
//! to one dense part per path and converted to a rigid tuple layout for
//! querying.
//!
//! Mutation is single-writer: nothing here locks, and readers may only share
//! a column once no mutator holds it.

use rustc_hash::FxHashSet;
use tracing::{debug, error};
use varcol_result::{Error, Result};
use varcol_types::{Field, FieldInfo};

use crate::part::ColumnPart;
use crate::path::ColumnPath;
use crate::subcolumn::Subcolumn;
use crate::tree::SubcolumnTree;

/// Columnar container for documents with a dynamic set of paths.
#[derive(Debug, Clone)]
pub struct ObjectColumn {
    /// Nullability policy for every subcolumn; fixed at construction.
    is_nullable: bool,
    subcolumns: SubcolumnTree,
    num_rows: usize,
}

impl ObjectColumn {
    pub fn new(is_nullable: bool) -> Self {
        Self {
            is_nullable,
            subcolumns: SubcolumnTree::new(),
            num_rows: 0,
        }
    }

    /// Wraps an existing tree. The row count is taken from the first
    /// populated path; all paths must agree on it.
    pub fn from_tree(subcolumns: SubcolumnTree, is_nullable: bool) -> Result<Self> {
        let num_rows = subcolumns
            .leaves()
            .first()
            .map(|(_, subcolumn)| subcolumn.size())
            .unwrap_or(0);
        let column = Self {
            is_nullable,
            subcolumns,
            num_rows,
        };
        column.check_consistency()?;
        Ok(column)
    }

    pub fn size(&self) -> usize {
        self.num_rows
    }

    pub fn empty(&self) -> bool {
        self.num_rows == 0
    }

    pub fn is_nullable(&self) -> bool {
        self.is_nullable
    }

    pub fn byte_size(&self) -> usize {
        self.subcolumns
            .leaves()
            .iter()
            .map(|(_, subcolumn)| subcolumn.byte_size())
            .sum()
    }

    pub fn allocated_bytes(&self) -> usize {
        self.subcolumns
            .leaves()
            .iter()
            .map(|(_, subcolumn)| subcolumn.allocated_bytes())
            .sum()
    }

    pub fn subcolumns(&self) -> &SubcolumnTree {
        &self.subcolumns
    }

    pub fn subcolumns_mut(&mut self) -> &mut SubcolumnTree {
        &mut self.subcolumns
    }

    pub fn has_subcolumn(&self, path: &ColumnPath) -> bool {
        self.subcolumns.contains(path)
    }

    pub fn get_subcolumn(&self, path: &ColumnPath) -> Option<&Subcolumn> {
        self.subcolumns.get(path)
    }

    pub fn get_subcolumn_mut(&mut self, path: &ColumnPath) -> Option<&mut Subcolumn> {
        self.subcolumns.get_mut(path)
    }

    /// Populated paths in stable iteration order.
    pub fn get_keys(&self) -> Vec<ColumnPath> {
        self.subcolumns.paths()
    }

    /// Comma-joined dotted paths, for diagnostics.
    pub fn get_keys_str(&self) -> String {
        self.get_keys()
            .iter()
            .map(ColumnPath::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// For callers that populate subcolumns directly through the tree and
    /// keep the row counter themselves.
    pub fn incr_num_rows(&mut self) {
        self.num_rows += 1;
    }

    /// Adds an empty subcolumn of `size` default rows at `path`.
    /// Returns false if the path is already populated.
    pub fn add_sub_column(&mut self, path: ColumnPath, size: usize) -> bool {
        self.subcolumns
            .add(path, Subcolumn::with_defaults(size, self.is_nullable))
    }

    /// Adds a subcolumn wrapping an existing dense part.
    pub fn add_sub_column_from_part(&mut self, path: ColumnPath, part: ColumnPart) -> bool {
        self.subcolumns
            .add(path, Subcolumn::from_part(part, self.is_nullable))
    }

    /// Adds a subcolumn that will hold nested arrays, copying the array
    /// shape of a sibling under the same parent so offsets stay consistent.
    /// Returns false on a duplicate path or when the sibling's size differs
    /// from `size`.
    pub fn add_nested_subcolumn(
        &mut self,
        path: ColumnPath,
        field_info: &FieldInfo,
        size: usize,
    ) -> bool {
        if self.subcolumns.contains(&path) {
            return false;
        }
        let sibling = path.parent().and_then(|parent| {
            self.subcolumns.leaves().into_iter().find(|(other, subcolumn)| {
                other != &path
                    && other.parent().as_ref() == Some(&parent)
                    && subcolumn.least_common_type().num_dimensions() > 0
            })
        });
        let subcolumn = match sibling {
            Some((_, sibling)) => {
                if sibling.size() != size {
                    return false;
                }
                match sibling.recreate_with_default_values(field_info) {
                    Ok(subcolumn) => subcolumn,
                    Err(_) => return false,
                }
            }
            None => Subcolumn::with_defaults(size, self.is_nullable),
        };
        self.subcolumns.add(path, subcolumn)
    }

    /// Bulk removal of populated paths.
    pub fn remove_subcolumns(&mut self, keys: &[ColumnPath]) {
        for key in keys {
            self.subcolumns.erase(key);
        }
        debug!(remaining = self.subcolumns.len(), "removed subcolumns");
    }

    /// Inserts one document row.
    ///
    /// The value must be object-shaped. Unknown paths get a fresh subcolumn
    /// back-filled with defaults; paths the document does not mention get one
    /// default appended. The operation is atomic by effect: on any failure
    /// every touched subcolumn is popped back and the row counter stays put.
    pub fn try_insert(&mut self, field: Field) -> Result<()> {
        let Field::Object(entries) = field else {
            return Err(Error::InvalidArgumentError(format!(
                "row value must be an object, got {field}"
            )));
        };
        let mut leaves = Vec::new();
        let mut prefix = Vec::new();
        flatten_document(&mut prefix, entries, &mut leaves);

        let old_size = self.num_rows;
        let mut touched: FxHashSet<ColumnPath> = FxHashSet::default();
        let mut created: Vec<ColumnPath> = Vec::new();
        for (path, value) in leaves {
            if touched.contains(&path) {
                self.rollback_row(&touched, &created);
                return Err(Error::InvalidArgumentError(format!(
                    "document contains path {path} more than once"
                )));
            }
            if !self.subcolumns.contains(&path) {
                self.subcolumns
                    .add(path.clone(), Subcolumn::with_defaults(old_size, self.is_nullable));
                created.push(path.clone());
            }
            let subcolumn = self
                .subcolumns
                .get_mut(&path)
                .ok_or_else(|| Error::Internal(format!("subcolumn {path} vanished mid-insert")))?;
            if let Err(e) = subcolumn.insert(value) {
                self.rollback_row(&touched, &created);
                return Err(e);
            }
            touched.insert(path);
        }
        for (path, subcolumn) in self.subcolumns.leaves_mut() {
            if !touched.contains(&path) {
                subcolumn.insert_default();
            }
        }
        self.num_rows += 1;
        Ok(())
    }

    /// Undoes a partially-inserted row: pops every touched subcolumn and
    /// erases subcolumns the row created, restoring the prior key set.
    fn rollback_row(&mut self, touched: &FxHashSet<ColumnPath>, created: &[ColumnPath]) {
        for path in created {
            self.subcolumns.erase(path);
        }
        for path in touched {
            if self.subcolumns.contains(path) {
                if let Some(subcolumn) = self.subcolumns.get_mut(path) {
                    subcolumn.pop_back(1);
                }
            }
        }
    }

    /// Copies row `n` of `src`, defaults included. Equivalent to a range
    /// insert of length 1.
    pub fn try_insert_from(&mut self, src: &ObjectColumn, n: usize) -> Result<()> {
        self.try_insert_range_from(src, n, 1)
    }

    /// Copies `length` rows of `src` starting at `start`. Paths absent on
    /// either side are materialized with defaults. Rolled back entirely on
    /// failure.
    pub fn try_insert_range_from(
        &mut self,
        src: &ObjectColumn,
        start: usize,
        length: usize,
    ) -> Result<()> {
        if start + length > src.num_rows {
            return Err(Error::InvalidArgumentError(format!(
                "range [{start}, {}) is out of bounds for a column of {} rows",
                start + length,
                src.num_rows
            )));
        }

        let old_rows = self.num_rows;
        // (path, size before this operation) for rollback.
        let mut touched: Vec<(ColumnPath, usize)> = Vec::new();
        let mut created: Vec<ColumnPath> = Vec::new();

        for path in self.get_keys() {
            let subcolumn = match self.subcolumns.get_mut(&path) {
                Some(subcolumn) => subcolumn,
                None => continue,
            };
            let prior = subcolumn.size();
            let outcome = match src.get_subcolumn(&path) {
                Some(src_subcolumn) => subcolumn.insert_range_from(src_subcolumn, start, length),
                None => {
                    subcolumn.insert_many_defaults(length);
                    Ok(())
                }
            };
            touched.push((path, prior));
            if let Err(e) = outcome {
                self.rollback_range(&touched, &created);
                return Err(e);
            }
        }

        for (path, src_subcolumn) in src.subcolumns.leaves() {
            if self.subcolumns.contains(&path) {
                continue;
            }
            let mut subcolumn = Subcolumn::with_defaults(old_rows, self.is_nullable);
            if let Err(e) = subcolumn.insert_range_from(src_subcolumn, start, length) {
                self.rollback_range(&touched, &created);
                return Err(e);
            }
            self.subcolumns.add(path.clone(), subcolumn);
            created.push(path.clone());
        }

        self.num_rows += length;
        Ok(())
    }

    /// Undoes a partially-applied range: pops touched subcolumns back to
    /// their prior sizes and erases the ones the range created.
    fn rollback_range(&mut self, touched: &[(ColumnPath, usize)], created: &[ColumnPath]) {
        for path in created {
            self.subcolumns.erase(path);
        }
        for (path, prior) in touched {
            if let Some(subcolumn) = self.subcolumns.get_mut(path) {
                let size = subcolumn.size();
                if size > *prior {
                    subcolumn.pop_back(size - prior);
                }
            }
        }
    }

    /// Gather variant: copies the listed rows of `src` in order.
    pub fn try_insert_indices_from(&mut self, src: &ObjectColumn, indices: &[usize]) -> Result<()> {
        let mut inserted = 0;
        for &index in indices {
            if let Err(e) = self.try_insert_range_from(src, index, 1) {
                self.pop_back(inserted);
                return Err(e);
            }
            inserted += 1;
        }
        Ok(())
    }

    /// Appends one default row to every subcolumn.
    pub fn insert_default(&mut self) {
        self.insert_many_defaults(1);
    }

    pub fn insert_many_defaults(&mut self, length: usize) {
        for (_, subcolumn) in self.subcolumns.leaves_mut() {
            subcolumn.insert_many_defaults(length);
        }
        self.num_rows += length;
    }

    /// Pops `length` rows from every subcolumn and the row counter.
    pub fn pop_back(&mut self, length: usize) {
        let length = length.min(self.num_rows);
        for (_, subcolumn) in self.subcolumns.leaves_mut() {
            subcolumn.pop_back(length);
        }
        self.num_rows -= length;
    }

    /// Reconstructs row `n` as a flat object keyed by dotted paths.
    pub fn field_at(&self, n: usize) -> Result<Field> {
        if n >= self.num_rows {
            return Err(Error::InvalidArgumentError(format!(
                "row {n} is out of bounds for a column of {} rows",
                self.num_rows
            )));
        }
        let entries = self
            .subcolumns
            .leaves()
            .into_iter()
            .map(|(path, subcolumn)| (path.to_string(), subcolumn.field_at(n)))
            .collect();
        Ok(Field::Object(entries))
    }

    /// Collapses every subcolumn to a single part of its least common type.
    pub fn finalize(&mut self) -> Result<()> {
        for (_, subcolumn) in self.subcolumns.leaves_mut() {
            subcolumn.finalize()?;
        }
        debug!(
            num_rows = self.num_rows,
            num_subcolumns = self.subcolumns.len(),
            "finalized object column"
        );
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.subcolumns
            .leaves()
            .iter()
            .all(|(_, subcolumn)| subcolumn.is_finalized())
    }

    /// Verifies that every subcolumn matches the row counter.
    pub fn check_consistency(&self) -> Result<()> {
        for (path, subcolumn) in self.subcolumns.leaves() {
            if subcolumn.size() != self.num_rows {
                error!(
                    path = %path,
                    subcolumn_rows = subcolumn.size(),
                    num_rows = self.num_rows,
                    "subcolumn size diverged from the row counter"
                );
                return Err(Error::ConsistencyViolation(format!(
                    "subcolumn {path} has {} rows, expected {}",
                    subcolumn.size(),
                    self.num_rows
                )));
            }
        }
        Ok(())
    }

    /// Deep copy truncated or default-extended to `new_size` rows.
    pub fn clone_resized(&self, new_size: usize) -> ObjectColumn {
        let mut cloned = self.clone();
        if new_size < cloned.num_rows {
            cloned.pop_back(cloned.num_rows - new_size);
        } else if new_size > cloned.num_rows {
            cloned.insert_many_defaults(new_size - cloned.num_rows);
        }
        cloned
    }

    /// Gathers the rows listed in `indices` into a new column. A `limit` of
    /// zero takes every index.
    pub fn index(&self, indices: &[usize], limit: usize) -> Result<ObjectColumn> {
        let take = if limit == 0 {
            indices.len()
        } else {
            limit.min(indices.len())
        };
        let mut gathered = ObjectColumn::new(self.is_nullable);
        gathered.try_insert_indices_from(self, &indices[..take])?;
        Ok(gathered)
    }

    /// Explodes one level of arrays: row `i` of each subcolumn must hold an
    /// array, all with equal lengths across subcolumns, and every element
    /// becomes its own row. Nulls count as empty arrays.
    pub fn strip_outer_array(&mut self) -> Result<()> {
        if self.subcolumns.is_empty() {
            return Ok(());
        }
        let mut stripped = ObjectColumn::new(self.is_nullable);
        for row in 0..self.num_rows {
            let mut row_items: Vec<(String, Vec<Field>)> = Vec::new();
            let mut row_len: Option<usize> = None;
            for (path, subcolumn) in self.subcolumns.leaves() {
                let items = match subcolumn.field_at(row) {
                    Field::Array(items) => items,
                    Field::Null => Vec::new(),
                    other => {
                        return Err(Error::InvalidArgumentError(format!(
                            "subcolumn {path} holds {other} at row {row}, expected an array"
                        )));
                    }
                };
                if *row_len.get_or_insert(items.len()) != items.len() {
                    return Err(Error::InvalidArgumentError(format!(
                        "array lengths diverge between subcolumns at row {row}"
                    )));
                }
                row_items.push((path.to_string(), items));
            }
            for element in 0..row_len.unwrap_or(0) {
                let entries = row_items
                    .iter()
                    .map(|(path, items)| (path.clone(), items[element].clone()))
                    .collect();
                stripped.try_insert(Field::Object(entries))?;
            }
        }
        *self = stripped;
        Ok(())
    }
}

/// Splits a document into `(path, leaf value)` pairs. Dotted keys and nested
/// objects address the same path space: `{"a.b": 1}` and `{"a": {"b": 1}}`
/// produce the same leaf.
fn flatten_document(
    prefix: &mut Vec<String>,
    entries: Vec<(String, Field)>,
    out: &mut Vec<(ColumnPath, Field)>,
) {
    for (key, value) in entries {
        let depth = key.split('.').count();
        for segment in key.split('.') {
            prefix.push(segment.to_string());
        }
        match value {
            Field::Object(inner) => flatten_document(prefix, inner, out),
            leaf => out.push((ColumnPath::from_segments(prefix.clone()), leaf)),
        }
        for _ in 0..depth {
            prefix.pop();
        }
    }
}
