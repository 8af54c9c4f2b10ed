use std::fmt;
use tracing::{debug, trace};

use super::holder::{AnyCell, Holder, NestedShape};
use crate::cell::{Modifiable, MutationCell};
use crate::random::RandomSource;
use crate::types::FastHashSet;

// ─── CellPath ───────────────────────────────────────────────────────────────

/// One hop from a holder into a nested holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub field: &'static str,
    /// Element index; always 0 for [`NestedShape::Single`].
    pub index: usize,
    pub shape: NestedShape,
}

/// Route from the walk root to one cell: nested hops, then the cell field.
///
/// Displays as `extensions[1].payload`; single-valued hops carry no index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CellPath {
    steps: Vec<PathStep>,
    field: &'static str,
}

impl CellPath {
    pub fn new(steps: Vec<PathStep>, field: &'static str) -> Self {
        Self { steps, field }
    }

    #[inline]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Name of the cell field in its owning holder.
    #[inline]
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Number of nested hops; 0 for cells on the root itself.
    #[inline]
    pub fn depth(&self) -> usize {
        self.steps.len()
    }
}

impl fmt::Display for CellPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            f.write_str(step.field)?;
            if step.shape != NestedShape::Single {
                write!(f, "[{}]", step.index)?;
            }
            f.write_str(".")?;
        }
        f.write_str(self.field)
    }
}

// ─── HolderRecord ───────────────────────────────────────────────────────────

/// A discovered cell together with the holder that owns it.
pub struct HolderRecord<'a> {
    pub owner: &'a dyn Holder,
    pub field: &'static str,
    pub cell: &'a dyn AnyCell,
    pub path: CellPath,
}

impl HolderRecord<'_> {
    #[inline]
    pub fn kind(&self) -> &'static str {
        self.cell.kind()
    }
}

impl fmt::Debug for HolderRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HolderRecord")
            .field("owner", &self.owner.holder_type())
            .field("field", &self.field)
            .field("kind", &self.cell.kind())
            .field("path", &format_args!("{}", self.path))
            .finish()
    }
}

// ─── Walk ───────────────────────────────────────────────────────────────────

// Keyed by address and concrete type: a struct and its first field can share
// an address.
type VisitKey = (usize, &'static str);

fn visit_key(holder: &dyn Holder) -> VisitKey {
    let address = std::ptr::from_ref(holder).cast::<()>() as usize;
    (address, holder.holder_type())
}

/// Pre-order walk: a holder, then each nested field in declaration order,
/// each element in order. A holder already seen in this walk is skipped,
/// which also cuts `Rc` cycles.
fn visit<'a>(
    holder: &'a dyn Holder,
    trail: &mut Vec<PathStep>,
    visited: &mut FastHashSet<VisitKey>,
    out: &mut Vec<(&'a dyn Holder, Vec<PathStep>)>,
) {
    if !visited.insert(visit_key(holder)) {
        trace!(holder = holder.holder_type(), "holder already visited");
        return;
    }
    out.push((holder, trail.clone()));
    for (field, nested) in holder.nested_slots() {
        let shape = nested.shape();
        for (index, child) in nested.holders().into_iter().enumerate() {
            trail.push(PathStep {
                field,
                index,
                shape,
            });
            visit(child, trail, visited, out);
            trail.pop();
        }
    }
}

fn walk(root: &dyn Holder) -> Vec<(&dyn Holder, Vec<PathStep>)> {
    let mut visited = FastHashSet::default();
    let mut out = Vec::new();
    visit(root, &mut Vec::new(), &mut visited, &mut out);
    out
}

/// Every holder reachable from `root`, root first, each exactly once.
pub fn find_holders(root: &dyn Holder) -> Vec<&dyn Holder> {
    walk(root).into_iter().map(|(holder, _)| holder).collect()
}

/// Every present cell reachable from `root`, each exactly once.
///
/// The order is stable for a given graph: holders in walk order, and within a
/// holder its cell fields in declaration order. Pair with a seeded index to
/// pick a target reproducibly.
pub fn find_cells(root: &dyn Holder) -> Vec<HolderRecord<'_>> {
    let holders = walk(root);
    let records: Vec<HolderRecord<'_>> = holders
        .iter()
        .flat_map(|(owner, steps)| {
            let owner = *owner;
            owner
                .cell_slots()
                .into_iter()
                .map(move |(field, cell)| HolderRecord {
                    owner,
                    field,
                    cell,
                    path: CellPath::new(steps.clone(), field),
                })
        })
        .collect();
    debug!(
        root = root.holder_type(),
        holders = holders.len(),
        cells = records.len(),
        "graph walk finished"
    );
    records
}

/// Only the cells holding a `T`, with their paths.
pub fn find_cells_of<T: Modifiable>(root: &dyn Holder) -> Vec<(CellPath, &MutationCell<T>)> {
    find_cells(root)
        .into_iter()
        .filter_map(|record| {
            record
                .cell
                .as_any()
                .downcast_ref::<MutationCell<T>>()
                .map(|cell| (record.path, cell))
        })
        .collect()
}

/// Uniform pick among [`find_cells`]; `None` when the graph has no cells.
pub fn choose_cell<'a>(
    root: &'a dyn Holder,
    rng: &mut dyn RandomSource,
) -> Option<HolderRecord<'a>> {
    let mut cells = find_cells(root);
    if cells.is_empty() {
        return None;
    }
    let idx = rng.next_index(cells.len());
    Some(cells.swap_remove(idx))
}

// ─── Mutable resolution ─────────────────────────────────────────────────────

/// Follow `path` from `root` to the cell it names.
///
/// `None` when the graph changed shape since the path was recorded, an
/// optional cell is empty, or a hop goes through an `Rc` that is shared.
pub fn resolve_cell_mut<'a>(
    root: &'a mut dyn Holder,
    path: &CellPath,
) -> Option<&'a mut dyn AnyCell> {
    let mut holder = root;
    for step in path.steps() {
        holder = holder.nested_slot_mut(step.field)?.holder_mut(step.index)?;
    }
    holder.cell_slot_mut(path.field())
}

pub fn resolve_mut<'a, T: Modifiable>(
    root: &'a mut dyn Holder,
    path: &CellPath,
) -> Option<&'a mut MutationCell<T>> {
    resolve_cell_mut(root, path)?
        .as_any_mut()
        .downcast_mut::<MutationCell<T>>()
}
