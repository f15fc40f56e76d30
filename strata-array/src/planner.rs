use std::collections::BTreeMap;
use std::ops::Range;

use itertools::Itertools;
use strata_dtype::Shape;
use strata_error::{StrataResult, strata_bail};

use crate::AxisSelection;

/// One read along one axis, and the output positions it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisBlock {
    span: Range<usize>,
    picks: Vec<(usize, usize)>,
}

impl AxisBlock {
    /// The contiguous range of root positions read for this block.
    pub fn span(&self) -> &Range<usize> {
        &self.span
    }

    /// `(output position, offset into span)` for every output position the block answers, in
    /// selection order.
    pub fn picks(&self) -> &[(usize, usize)] {
        &self.picks
    }
}

/// The blocks covering the selection along one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisPlan {
    len: usize,
    blocks: Vec<AxisBlock>,
}

impl AxisPlan {
    /// The number of output positions along this axis.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the axis selects nothing.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The blocks, in ascending span order.
    pub fn blocks(&self) -> &[AxisBlock] {
        &self.blocks
    }
}

/// An N-dimensional read plan: the Cartesian product of per-axis blocks.
///
/// Every output coordinate is answered by exactly one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPlan {
    axes: Vec<AxisPlan>,
}

impl BlockPlan {
    /// The per-axis plans, in caller order.
    pub fn axes(&self) -> &[AxisPlan] {
        &self.axes
    }

    /// The shape of the assembled output.
    pub fn output_shape(&self) -> Shape {
        self.axes.iter().map(AxisPlan::len).collect_vec().into()
    }

    /// The number of reads the plan issues.
    pub fn nblocks(&self) -> usize {
        self.axes.iter().map(|a| a.blocks.len()).product()
    }

    /// Iterate the blocks with the first caller axis varying fastest, which walks the on-disk
    /// layout in storage order.
    pub fn blocks(&self) -> Blocks<'_> {
        let cursor = self
            .axes
            .iter()
            .all(|a| !a.blocks.is_empty())
            .then(|| vec![0; self.axes.len()]);
        Blocks { plan: self, cursor }
    }
}

/// One N-dimensional block of a [`BlockPlan`].
#[derive(Debug, Clone)]
pub struct Block<'a> {
    axes: Vec<&'a AxisBlock>,
}

impl Block<'_> {
    /// The per-axis blocks, in caller order.
    pub fn axes(&self) -> &[&AxisBlock] {
        &self.axes
    }

    /// The hyperslab to read, in caller order.
    pub fn ranges(&self) -> Vec<Range<usize>> {
        self.axes.iter().map(|a| a.span.clone()).collect()
    }

    /// The extents of the hyperslab, in caller order.
    pub fn shape(&self) -> Shape {
        self.axes.iter().map(|a| a.span.len()).collect_vec().into()
    }
}

/// Iterator over the blocks of a [`BlockPlan`].
pub struct Blocks<'a> {
    plan: &'a BlockPlan,
    cursor: Option<Vec<usize>>,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = Block<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        let block = Block {
            axes: self
                .plan
                .axes
                .iter()
                .zip(cursor.iter())
                .map(|(axis, i)| &axis.blocks[*i])
                .collect(),
        };

        let mut exhausted = true;
        for (axis, i) in self.plan.axes.iter().zip(cursor.iter_mut()) {
            *i += 1;
            if *i < axis.blocks.len() {
                exhausted = false;
                break;
            }
            *i = 0;
        }
        if exhausted {
            self.cursor = None;
        }

        Some(block)
    }
}

/// Partitions per-axis selections into chunk-aligned rectangular reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPlanner {
    block_shape: Vec<usize>,
}

impl BlockPlanner {
    /// A planner grouping positions into blocks of `block_shape`, in caller order.
    pub fn new(block_shape: Vec<usize>) -> Self {
        Self { block_shape }
    }

    /// The block extents, in caller order.
    pub fn block_shape(&self) -> &[usize] {
        &self.block_shape
    }

    /// Plan reads for validated `selections` over an array of the given caller-order `extents`.
    ///
    /// Fails with `ShapeMismatch` unless the selections, the extents and the block shape all
    /// name the same number of axes.
    pub fn plan(&self, selections: &[AxisSelection], extents: &[usize]) -> StrataResult<BlockPlan> {
        if selections.len() != extents.len() || self.block_shape.len() != extents.len() {
            strata_bail!(
                ShapeMismatch: "cannot plan {} selections over {} axes with block shape ({})",
                selections.len(),
                extents.len(),
                self.block_shape.iter().join(", ")
            );
        }
        let axes = selections
            .iter()
            .zip(extents)
            .zip(self.block_shape.iter())
            .map(|((selection, extent), block)| Self::plan_axis(selection, *extent, *block))
            .collect_vec();
        let plan = BlockPlan { axes };
        log::debug!(
            "planned {} blocks for output {} with block shape ({})",
            plan.nblocks(),
            plan.output_shape(),
            self.block_shape.iter().join(", ")
        );
        Ok(plan)
    }

    /// Plan one axis.
    ///
    /// A contiguous ascending selection becomes a single span. Anything else is grouped by the
    /// block of `block` positions each entry falls in, and each group reads the tight range
    /// between its smallest and largest entry. Unsorted and repeated entries keep their output
    /// positions.
    pub fn plan_axis(selection: &AxisSelection, extent: usize, block: usize) -> AxisPlan {
        let len = selection.len(extent);
        if len == 0 {
            return AxisPlan {
                len,
                blocks: Vec::new(),
            };
        }
        if let Some(span) = selection.as_contiguous(extent) {
            return AxisPlan {
                len,
                blocks: vec![AxisBlock {
                    span,
                    picks: (0..len).map(|k| (k, k)).collect(),
                }],
            };
        }

        let block = block.max(1);
        let mut groups: BTreeMap<usize, Vec<(usize, usize)>> = BTreeMap::new();
        for (out, pos) in selection.positions(extent).enumerate() {
            groups.entry(pos / block).or_default().push((out, pos));
        }

        let blocks = groups
            .into_values()
            .map(|members| {
                let (lo, hi) = members
                    .iter()
                    .map(|(_, pos)| *pos)
                    .minmax()
                    .into_option()
                    .unwrap_or_default();
                AxisBlock {
                    span: lo..hi + 1,
                    picks: members.into_iter().map(|(out, pos)| (out, pos - lo)).collect(),
                }
            })
            .collect();
        AxisPlan { len, blocks }
    }
}
