use std::fmt::{Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;
use strata_dtype::Shape;
use strata_error::{StrataResult, strata_bail, strata_err};

use crate::selection::validate_all;
use crate::{AxisSelection, LazyArray};

/// Identifies a view inside a [`ViewArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(usize);

impl Display for ViewId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct ViewNode {
    parent: Option<ViewId>,
    selections: Arc<[AxisSelection]>,
    shape: Shape,
}

/// A tree of lazy views over one [`LazyArray`].
///
/// Views are appended and never removed or modified, and a view's parent always precedes it, so
/// the tree is acyclic by construction. The root view selects the whole array. Building views
/// performs no I/O.
#[derive(Clone)]
pub struct ViewArena {
    array: LazyArray,
    nodes: Vec<ViewNode>,
}

impl ViewArena {
    /// Start a tree rooted at `array`.
    pub fn new(array: LazyArray) -> Self {
        let shape = array.shape().clone();
        let root = ViewNode {
            parent: None,
            selections: vec![AxisSelection::Full; shape.ndim()].into(),
            shape,
        };
        Self {
            array,
            nodes: vec![root],
        }
    }

    /// The view selecting the whole array.
    pub fn root(&self) -> ViewId {
        ViewId(0)
    }

    /// The array every view is ultimately drawn from.
    pub fn array(&self) -> &LazyArray {
        &self.array
    }

    /// The number of views in the tree, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root view exists from construction.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: ViewId) -> StrataResult<&ViewNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| strata_err!("{} does not belong to this arena", id))
    }

    /// The shape of a view.
    pub fn shape(&self, id: ViewId) -> StrataResult<&Shape> {
        Ok(&self.node(id)?.shape)
    }

    /// The view a view was drawn from, or `None` for the root.
    pub fn parent(&self, id: ViewId) -> StrataResult<Option<ViewId>> {
        Ok(self.node(id)?.parent)
    }

    /// The selections a view applies to its parent.
    pub fn selections(&self, id: ViewId) -> StrataResult<&[AxisSelection]> {
        Ok(&self.node(id)?.selections)
    }

    /// Create a view selecting `selections` out of `parent`, one per axis of the parent.
    ///
    /// Fails with `ShapeMismatch` for the wrong number of selections, `IndexOutOfRange` for a
    /// position outside its axis, and `InvalidArgument` for a scalar selection.
    pub fn subset(&mut self, parent: ViewId, selections: &[AxisSelection]) -> StrataResult<ViewId> {
        let parent_shape = self.shape(parent)?;
        check_view_selections(selections, parent_shape)?;
        let shape: Shape = selections
            .iter()
            .zip(parent_shape.iter())
            .map(|(s, extent)| s.len(*extent))
            .collect_vec()
            .into();

        let id = ViewId(self.nodes.len());
        self.nodes.push(ViewNode {
            parent: Some(parent),
            selections: selections.into(),
            shape,
        });
        log::trace!("{} = {}[{}]", id, parent, selections.iter().join(", "));
        Ok(id)
    }

    /// Express a view in root array coordinates.
    pub fn resolve(&self, id: ViewId) -> StrataResult<ResolvedSelection> {
        let node = self.node(id)?;
        Ok(self.compose_upwards(node.parent, node.selections.to_vec()))
    }

    /// Express `selections`, taken out of view `id`, in root array coordinates.
    ///
    /// Equivalent to resolving a temporary `subset(id, selections)`; scalars are allowed here
    /// and select single positions.
    pub fn resolve_with(
        &self,
        id: ViewId,
        selections: &[AxisSelection],
    ) -> StrataResult<ResolvedSelection> {
        validate_all(selections, self.shape(id)?)?;
        Ok(self.compose_upwards(Some(id), selections.to_vec()))
    }

    /// Walk from `parent` to the root, applying each ancestor's selections outside `selections`.
    fn compose_upwards(
        &self,
        mut parent: Option<ViewId>,
        mut selections: Vec<AxisSelection>,
    ) -> ResolvedSelection {
        while let Some(id) = parent {
            let node = &self.nodes[id.0];
            for (inner, outer) in selections.iter_mut().zip(node.selections.iter()) {
                *inner = outer.compose(inner);
            }
            parent = node.parent;
        }
        ResolvedSelection {
            root_shape: self.array.shape().clone(),
            axes: selections,
        }
    }
}

fn check_view_selections(selections: &[AxisSelection], shape: &Shape) -> StrataResult<()> {
    validate_all(selections, shape)?;
    if let Some(axis) = selections
        .iter()
        .position(|s| matches!(s, AxisSelection::Scalar(_)))
    {
        strata_bail!(
            "scalar selection on axis {} is only valid for element access",
            axis
        );
    }
    Ok(())
}

/// A selection expressed in root array coordinates, one entry per root axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    root_shape: Shape,
    axes: Vec<AxisSelection>,
}

impl ResolvedSelection {
    /// Select the whole of an array of `root_shape`.
    pub fn full(root_shape: Shape) -> Self {
        Self {
            axes: vec![AxisSelection::Full; root_shape.ndim()],
            root_shape,
        }
    }

    /// The caller-order shape of the root array.
    pub fn root_shape(&self) -> &Shape {
        &self.root_shape
    }

    /// The per-axis selections in root coordinates.
    pub fn axes(&self) -> &[AxisSelection] {
        &self.axes
    }

    /// The number of axes.
    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    /// The shape of the selected region.
    pub fn shape(&self) -> Shape {
        self.axes
            .iter()
            .zip(self.root_shape.iter())
            .map(|(s, extent)| s.len(*extent))
            .collect_vec()
            .into()
    }

    /// Select `selections` out of the region, in region-relative positions.
    pub fn compose(&self, selections: &[AxisSelection]) -> StrataResult<Self> {
        validate_all(selections, &self.shape())?;
        Ok(Self {
            root_shape: self.root_shape.clone(),
            axes: self
                .axes
                .iter()
                .zip(selections)
                .map(|(outer, inner)| outer.compose(inner))
                .collect(),
        })
    }

    /// The absolute positions selected along `axis`.
    pub fn positions(&self, axis: usize) -> Vec<usize> {
        self.axes[axis].positions(self.root_shape[axis]).collect()
    }
}
