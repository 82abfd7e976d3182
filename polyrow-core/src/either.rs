//! Either-path resolution
//!
//! A nested Either tree such as `either<either<string, number>, either<Range, array<Position>>>`
//! has four leaves. Each leaf is reached by a sequence of left/right choices
//! from the root: `number` sits at `[Left, Right]`. The resolver walks the
//! tree once, depth first and left before right, and records every leaf with
//! its choice sequence. That pre-order is the order in which the matcher tries
//! leaves, so it also decides which variant wins when several would accept a
//! value.
//!
//! The walk produces an arena of [`ChoiceNode`]s. Every node knows its parent
//! by index and which branch led to it, so a leaf's position can be traced back
//! to the root without any back-pointers between live objects.
//!
//! Resolutions are cached per distinct Either root (structural equality).
//! [`MethodRegistry`](crate::registry::MethodRegistry) fills the cache while
//! methods are registered; a lazily resolved root is computed outside the lock
//! and the first stored result wins, so concurrent first lookups converge.

use crate::descriptor::{EitherType, TypeDescriptor};
use crate::error::{Error, Result};
use crate::value::{EitherValue, TypedValue};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Deepest Either nesting accepted unless configured otherwise
pub const DEFAULT_DEPTH_LIMIT: usize = 32;

/// One side of an Either
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    Left,
    Right,
}

impl Branch {
    pub fn is_left(self) -> bool {
        self == Branch::Left
    }

    pub fn is_right(self) -> bool {
        self == Branch::Right
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::Left => f.write_str("left"),
            Branch::Right => f.write_str("right"),
        }
    }
}

/// A node of the resolved tree: an Either or a leaf
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceNode {
    descriptor: TypeDescriptor,
    parent: Option<usize>,
    branch: Option<Branch>,
}

impl ChoiceNode {
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Arena index of the enclosing Either, `None` for the root
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Branch of the parent that leads here, `None` for the root
    pub fn branch(&self) -> Option<Branch> {
        self.branch
    }
}

/// Position of one leaf inside an Either tree
#[derive(Debug, Clone, PartialEq)]
pub struct EitherPath {
    index: usize,
    node: usize,
    choices: Vec<Branch>,
    leaf: TypeDescriptor,
}

impl EitherPath {
    /// Ordinal of the leaf in pre-order
    pub fn index(&self) -> usize {
        self.index
    }

    /// Arena index of the leaf node
    pub fn node(&self) -> usize {
        self.node
    }

    /// Choices from the root down to the leaf
    pub fn choices(&self) -> &[Branch] {
        &self.choices
    }

    pub fn leaf(&self) -> &TypeDescriptor {
        &self.leaf
    }

    /// Tag a decoded leaf value with this path's choices
    ///
    /// The result nests one [`EitherValue`] per choice, outermost first.
    pub fn wrap(&self, value: TypedValue) -> TypedValue {
        self.choices.iter().rev().fold(value, |inner, branch| {
            TypedValue::Either(EitherValue::new(*branch, inner))
        })
    }
}

/// Every leaf of one Either root, in pre-order
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEither {
    root: EitherType,
    nodes: Vec<ChoiceNode>,
    paths: Vec<EitherPath>,
}

impl ResolvedEither {
    /// Walk `root` and collect its leaves
    ///
    /// # Errors
    ///
    /// `Error::UnboundedEitherDepth` if the tree nests deeper than `depth_limit`.
    pub fn build(root: &EitherType, depth_limit: usize) -> Result<Self> {
        if root.depth() > depth_limit {
            return Err(Error::UnboundedEitherDepth {
                depth: root.depth(),
                limit: depth_limit,
            });
        }

        let mut nodes = Vec::new();
        let mut paths = Vec::new();
        let mut stack: Vec<(TypeDescriptor, Option<usize>, Option<Branch>, Vec<Branch>)> =
            vec![(TypeDescriptor::Either(root.clone()), None, None, Vec::new())];

        while let Some((descriptor, parent, branch, choices)) = stack.pop() {
            let node = nodes.len();
            nodes.push(ChoiceNode {
                descriptor: descriptor.clone(),
                parent,
                branch,
            });

            match descriptor {
                TypeDescriptor::Either(either) => {
                    // Right is pushed first so left is visited first.
                    let mut right = choices.clone();
                    right.push(Branch::Right);
                    stack.push((either.right().clone(), Some(node), Some(Branch::Right), right));

                    let mut left = choices;
                    left.push(Branch::Left);
                    stack.push((either.left().clone(), Some(node), Some(Branch::Left), left));
                }
                leaf => paths.push(EitherPath {
                    index: paths.len(),
                    node,
                    choices,
                    leaf,
                }),
            }
        }

        Ok(Self {
            root: root.clone(),
            nodes,
            paths,
        })
    }

    pub fn root(&self) -> &EitherType {
        &self.root
    }

    /// Leaves in the order the matcher tries them
    pub fn paths(&self) -> &[EitherPath] {
        &self.paths
    }

    pub fn nodes(&self) -> &[ChoiceNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&ChoiceNode> {
        self.nodes.get(index)
    }

    /// Parent node of `index`
    pub fn parent(&self, index: usize) -> Option<&ChoiceNode> {
        self.node(index)?.parent.and_then(|p| self.nodes.get(p))
    }

    /// Arena indices from `index` (exclusive) up to the root (inclusive)
    pub fn ancestors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let mut current = self.node(index).and_then(|n| n.parent);
        std::iter::from_fn(move || {
            let here = current?;
            current = self.nodes.get(here).and_then(|n| n.parent);
            Some(here)
        })
    }

    /// Leaf reached by exactly these choices
    pub fn path_for(&self, choices: &[Branch]) -> Option<&EitherPath> {
        self.paths.iter().find(|p| p.choices == choices)
    }
}

/// Resolves and caches Either trees
#[derive(Debug)]
pub struct EitherResolver {
    depth_limit: usize,
    cache: RwLock<HashMap<EitherType, Arc<ResolvedEither>>>,
}

impl Default for EitherResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl EitherResolver {
    pub fn new() -> Self {
        Self::with_depth_limit(DEFAULT_DEPTH_LIMIT)
    }

    pub fn with_depth_limit(depth_limit: usize) -> Self {
        Self {
            depth_limit,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn depth_limit(&self) -> usize {
        self.depth_limit
    }

    /// Resolved leaves of `root`, from cache when possible
    pub fn resolve(&self, root: &EitherType) -> Result<Arc<ResolvedEither>> {
        if let Some(resolved) = self.cache.read().get(root) {
            return Ok(Arc::clone(resolved));
        }

        let resolved = Arc::new(ResolvedEither::build(root, self.depth_limit)?);
        debug!(
            leaves = resolved.paths().len(),
            depth = root.depth(),
            "Resolved either tree"
        );

        let mut cache = self.cache.write();
        Ok(Arc::clone(
            cache.entry(root.clone()).or_insert(resolved),
        ))
    }

    /// Leaves of `root` in pre-order
    pub fn resolve_paths(&self, root: &EitherType) -> Result<Vec<EitherPath>> {
        Ok(self.resolve(root)?.paths().to_vec())
    }

    pub fn is_cached(&self, root: &EitherType) -> bool {
        self.cache.read().contains_key(root)
    }

    /// Number of cached Either roots
    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }

    /// Resolve every Either root reachable from `descriptor`
    ///
    /// Roots nested under arrays, maps, object properties or Either leaves
    /// are included. Returns the number of roots visited.
    pub fn preload(&self, descriptor: &TypeDescriptor) -> Result<usize> {
        let mut visited = 0;
        let mut stack = vec![descriptor.clone()];

        while let Some(current) = stack.pop() {
            match current {
                TypeDescriptor::Either(either) => {
                    let resolved = self.resolve(&either)?;
                    visited += 1;
                    stack.extend(resolved.paths().iter().map(|p| p.leaf().clone()));
                }
                TypeDescriptor::Object(object) => {
                    stack.extend(object.properties().iter().map(|p| p.ty().clone()));
                }
                TypeDescriptor::Array(array) => stack.push(array.element().clone()),
                TypeDescriptor::Map(map) => stack.push(map.value().clone()),
                TypeDescriptor::Scalar(_) | TypeDescriptor::Any => {}
            }
        }

        Ok(visited)
    }
}
