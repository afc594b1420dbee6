//! Merge application
//!
//! A batch can contain chains: `a -> b` and `b -> c` planned in the same
//! pass because `b` was itself undersized. Before anything is written, every
//! target is resolved to the end of its chain so each source lands in a
//! clump that is still live. Targets are strictly larger than their sources
//! in the pre-pass state, so chains cannot loop back on themselves.

use super::clump_table::ClumpTable;
use super::planner::MergeDirective;
use std::collections::HashMap;
use terraclump_core::raster::LabelAccess;
use terraclump_core::{Error, Result};

/// Union-find over the sources of one batch
struct ChainResolver {
    parent: HashMap<u32, u32>,
}

impl ChainResolver {
    fn new(directives: &[MergeDirective]) -> Result<Self> {
        let mut parent = HashMap::with_capacity(directives.len());
        for d in directives {
            if d.source == d.target {
                return Err(Error::Algorithm(format!("clump {} merges into itself", d.source)));
            }
            if parent.insert(d.source, d.target).is_some() {
                return Err(Error::Algorithm(format!(
                    "clump {} is the source of more than one merge",
                    d.source
                )));
            }
        }
        Ok(Self { parent })
    }

    /// Final live clump reached from `id`, compressing the path behind it
    fn find(&mut self, id: u32) -> Result<u32> {
        let mut root = id;
        let mut steps = 0;
        while let Some(&next) = self.parent.get(&root) {
            root = next;
            steps += 1;
            if steps > self.parent.len() {
                return Err(Error::Algorithm(format!("merge chain from clump {} loops", id)));
            }
        }

        let mut node = id;
        while let Some(&next) = self.parent.get(&node) {
            if next == root {
                break;
            }
            self.parent.insert(node, root);
            node = next;
        }
        Ok(root)
    }
}

/// Rewrite each directive's target to the final live clump of its chain.
///
/// Order is preserved. Fails on self-merges, duplicate sources, or cycles.
pub fn resolve_chains(directives: &[MergeDirective]) -> Result<Vec<MergeDirective>> {
    let mut resolver = ChainResolver::new(directives)?;
    directives
        .iter()
        .map(|d| Ok(MergeDirective::new(d.source, resolver.find(d.target)?)))
        .collect()
}

/// Commit a batch of directives in order.
///
/// For each directive the source's pixels are relabelled to the (resolved)
/// target in the raster and appended to the target's pixel list; sums are
/// accumulated, the target mean refreshed, and the source released.
/// Returns the number of merges applied.
pub fn apply_merges<L: LabelAccess + ?Sized>(
    table: &mut ClumpTable,
    labels: &mut L,
    directives: &[MergeDirective],
) -> Result<usize> {
    let resolved = resolve_chains(directives)?;

    for d in &resolved {
        match table.get(d.target) {
            Some(target) if target.is_active() => {}
            Some(_) => {
                return Err(Error::Algorithm(format!(
                    "merge target {} is no longer active",
                    d.target
                )))
            }
            None => {
                return Err(Error::LabelOutOfRange {
                    label: d.target,
                    capacity: table.capacity(),
                })
            }
        }

        let source = table.get_mut(d.source)?;
        if !source.is_active() {
            return Err(Error::Algorithm(format!("clump {} was already merged", d.source)));
        }
        let (pixels, band_sum) = source.release();

        for &(row, col) in &pixels {
            labels.set_label(row, col, d.target);
        }

        table.get_mut(d.target)?.absorb(pixels, &band_sum);
    }

    Ok(resolved.len())
}
