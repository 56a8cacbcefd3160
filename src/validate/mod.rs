//! Path validation
//!
//! Decides, without touching the tree, whether the new vertex can be
//! inserted and which template each node on the affected path receives.
//!
//! Notation for the vertex `u` being inserted, with predecessor set `Adj`:
//! - `nSmall`: deepest node owning a predecessor
//! - path `p`: the section of a Q-node whose child leads down to `nSmall`
//! - covering vertices of a path node: its bag (P-node) or the vertices
//!   whose span contains `p` (Q-node above `nSmall`)
//! - `nBig`: highest path node with a covering vertex outside `Adj`, or
//!   `nSmall` when there is none
//!
//! The insertion is feasible when every hit node lies on the root path of
//! `nSmall`, every predecessor owned by a Q-node above `nSmall` covers the
//! path section, and each node from `nSmall` up to `nBig` admits a template.
//!
//! Every test reads the predecessors a node owns and the bags of the
//! sections it inspects; a node's remaining vertices are only counted.

use crate::graph::Vertex;
use crate::labeling::{Label, LabelingResult};
use crate::tree::{InvariantViolation, MpqTree, NodeId, NodeKind, QNode};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Orientation of a Q-node relative to the new vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Side {
    /// New vertex enters from the first section
    Left,
    /// New vertex enters from the last section
    Right,
}

/// Local rewrite applied at one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Template {
    /// Leaf whose bag is all predecessors: `u` joins the bag
    L1,
    /// Leaf with non-adjacent vertices: split into adjacent parent and
    /// non-adjacent leaf, `u` becomes a sibling leaf
    L2,
    /// P-node whose bag is all predecessors: `u` becomes a new child leaf
    P1,
    /// P-node with non-adjacent vertices: split the bag, the old children move
    /// under the non-adjacent half
    P2,
    /// Q-node section whose bag equals the predecessors: `u` hangs below it
    Q1 {
        /// Receiving section
        section: usize,
    },
    /// Q-node gap: a new section holding `u` is inserted
    Q2 {
        /// Index the new section takes (`0..=sections`)
        gap: usize,
    },
    /// P-node above `nSmall`: folded into the section chain
    P3,
    /// Q-node above `nSmall`: the chain replaces the path section
    Q3 {
        /// Path section before any reversal
        section: usize,
        /// Side the chain opens towards
        side: Side,
    },
}

impl Template {
    /// Short name ("L1", "Q3", ...)
    pub fn name(&self) -> &'static str {
        match self {
            Template::L1 => "L1",
            Template::L2 => "L2",
            Template::P1 => "P1",
            Template::P2 => "P2",
            Template::Q1 { .. } => "Q1",
            Template::Q2 { .. } => "Q2",
            Template::P3 => "P3",
            Template::Q3 { .. } => "Q3",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Q1 { section } => write!(f, "Q1@{}", section),
            Template::Q2 { gap } => write!(f, "Q2@{}", gap),
            Template::Q3 { section, side } => write!(f, "Q3@{}{:?}", section, side),
            other => f.write_str(other.name()),
        }
    }
}

/// One node of the plan with its template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Node rewritten
    pub node: NodeId,
    /// Template applied
    pub template: Template,
}

/// Validated rewrite plan, from `nSmall` up to `nBig`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPlan {
    steps: Vec<Step>,
}

impl PathPlan {
    /// Steps bottom-up; the first step is `nSmall`, the last is `nBig`
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// `nSmall`
    pub fn small(&self) -> Option<NodeId> {
        self.steps.first().map(|s| s.node)
    }

    /// `nBig`
    pub fn big(&self) -> Option<NodeId> {
        self.steps.last().map(|s| s.node)
    }

    /// True when a single node changes
    pub fn is_single(&self) -> bool {
        self.steps.len() == 1
    }
}

/// Why a vertex cannot be inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Obstruction {
    /// A node owning predecessors is off the root path of `nSmall`
    BranchingPath {
        /// Offending node
        node: NodeId,
    },
    /// A predecessor owned by a Q-node does not cover the path section
    SectionMismatch {
        /// Q-node
        node: NodeId,
        /// Path section
        section: usize,
        /// Predecessor outside the section
        vertex: Vertex,
    },
    /// No section of `nSmall` fits the predecessors and no gap can take `u`
    NoSection {
        /// Q-node
        node: NodeId,
    },
    /// `nSmall` is a Q-node whose predecessors reach neither end
    NoOuterGap {
        /// Q-node
        node: NodeId,
    },
    /// Q-node strictly between `nSmall` and `nBig` entered through an inner section
    InteriorSection {
        /// Q-node
        node: NodeId,
        /// Path section
        section: usize,
    },
    /// `nBig` is a Q-node with non-adjacent vertices reaching past the path
    /// section on both sides
    BothSides {
        /// Q-node
        node: NodeId,
        /// Path section
        section: usize,
    },
}

impl Obstruction {
    /// Node at which the insertion failed
    pub fn node(&self) -> NodeId {
        match *self {
            Obstruction::BranchingPath { node }
            | Obstruction::SectionMismatch { node, .. }
            | Obstruction::NoSection { node }
            | Obstruction::NoOuterGap { node }
            | Obstruction::InteriorSection { node, .. }
            | Obstruction::BothSides { node, .. } => node,
        }
    }
}

impl fmt::Display for Obstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Obstruction::BranchingPath { node } => {
                write!(f, "predecessors branch off the path at {}", node)
            }
            Obstruction::SectionMismatch {
                node,
                section,
                vertex,
            } => write!(
                f,
                "vertex {} of Q-node {} misses path section {}",
                vertex, node, section
            ),
            Obstruction::NoSection { node } => {
                write!(f, "no section or gap of Q-node {} fits", node)
            }
            Obstruction::NoOuterGap { node } => {
                write!(f, "Q-node {} cannot open an outer section", node)
            }
            Obstruction::InteriorSection { node, section } => {
                write!(f, "path enters Q-node {} at inner section {}", node, section)
            }
            Obstruction::BothSides { node, section } => write!(
                f,
                "Q-node {} is blocked on both sides of section {}",
                node, section
            ),
        }
    }
}

/// Validator verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Insertion feasible
    Valid(PathPlan),
    /// Not an interval graph
    Rejected(Obstruction),
}

/// A node on the root path of `nSmall`
#[derive(Debug, Clone, Copy)]
struct PathNode {
    id: NodeId,
    /// Section of a Q-node leading down the path (`None` at `nSmall`)
    section: Option<usize>,
}

/// Check the labelled tree and produce a plan
pub fn validate(tree: &MpqTree, labels: &LabelingResult) -> Result<Validation, InvariantViolation> {
    let adjacent = labels.predecessors();
    let Some(small) = labels.small() else {
        // Isolated so far: new component under the root
        return Ok(Validation::Valid(PathPlan {
            steps: vec![Step {
                node: tree.root(),
                template: Template::P1,
            }],
        }));
    };

    let ids = tree.path_to_root(small)?;
    let on_path: HashSet<NodeId> = ids.iter().copied().collect();
    if let Some(node) = labels.hit_nodes().find(|n| !on_path.contains(n)) {
        return Ok(Validation::Rejected(Obstruction::BranchingPath { node }));
    }

    let mut path = Vec::with_capacity(ids.len());
    path.push(PathNode {
        id: small,
        section: None,
    });
    for pair in ids.windows(2) {
        let (child, id) = (pair[0], pair[1]);
        let section = match tree.node(id)?.kind() {
            NodeKind::Q(q) => Some(q.section_of(child).ok_or(
                InvariantViolation::ParentMismatch {
                    node: child,
                    expected: Some(id),
                    found: None,
                },
            )?),
            NodeKind::P(_) => None,
        };
        path.push(PathNode { id, section });
    }

    let mut big = 0;
    for (idx, step) in path.iter().enumerate().skip(1) {
        let node = tree.node(step.id)?;
        match (node.kind(), step.section) {
            (NodeKind::P(p), _) => {
                if labels.hits(step.id) < p.bag().len() {
                    big = idx;
                }
            }
            (NodeKind::Q(q), Some(section)) => {
                let owned = labels.owned(step.id);
                if let Some(&vertex) = owned
                    .iter()
                    .find(|&&v| !q.span(v).is_some_and(|span| span.contains(section)))
                {
                    return Ok(Validation::Rejected(Obstruction::SectionMismatch {
                        node: step.id,
                        section,
                        vertex,
                    }));
                }
                // every owned predecessor covers the section; anything else in
                // its bag is not adjacent
                if q.section_bag(section).map_or(0, BTreeSet::len) > owned.len() {
                    big = idx;
                }
            }
            (NodeKind::Q(_), None) => {
                return Err(InvariantViolation::TemplateMismatch {
                    template: "Q3",
                    node: step.id,
                    reason: "Q-node on the path without a path section".to_string(),
                })
            }
        }
    }

    let plan = if big == 0 {
        single(tree, labels, small, adjacent)?.map(|template| vec![Step {
            node: small,
            template,
        }])
    } else {
        run(tree, labels, &path[..=big], adjacent)?
    };

    Ok(match plan {
        Ok(steps) => Validation::Valid(PathPlan { steps }),
        Err(obstruction) => Validation::Rejected(obstruction),
    })
}

/// Template for `nSmall == nBig`
fn single(
    tree: &MpqTree,
    labels: &LabelingResult,
    small: NodeId,
    adjacent: &BTreeSet<Vertex>,
) -> Result<Result<Template, Obstruction>, InvariantViolation> {
    let node = tree.node(small)?;
    let all_adjacent = labels.label(small) == Label::Full;
    Ok(match node.kind() {
        NodeKind::P(p) if p.is_leaf() => Ok(if all_adjacent {
            Template::L1
        } else {
            Template::L2
        }),
        NodeKind::P(_) => Ok(if all_adjacent {
            Template::P1
        } else {
            Template::P2
        }),
        NodeKind::Q(q) => {
            let owned = labels.owned(small);
            let (lo, hi) = shared_sections(q, owned);
            if let Some(section) = receiving_section(q, owned, lo, hi) {
                Ok(Template::Q1 { section })
            } else if let Some(gap) =
                (lo..=(hi + 1).min(q.section_count())).find(|&g| gap_is_clear(q, adjacent, g))
            {
                Ok(Template::Q2 { gap })
            } else {
                Err(Obstruction::NoSection { node: small })
            }
        }
    })
}

/// Sections inside every span of `owned` (`lo > hi` when they share none)
fn shared_sections(q: &QNode, owned: &[Vertex]) -> (usize, usize) {
    let (mut lo, mut hi) = (0, q.section_count().saturating_sub(1));
    for span in owned.iter().filter_map(|&v| q.span(v)) {
        lo = lo.max(span.first);
        hi = hi.min(span.last);
    }
    (lo, hi)
}

/// Section in `lo..=hi` whose bag is exactly the owned predecessors
fn receiving_section(q: &QNode, owned: &[Vertex], lo: usize, hi: usize) -> Option<usize> {
    // each bag in the range already holds all of `owned`
    (lo..=hi).find(|&j| q.section_bag(j).is_some_and(|bag| bag.len() == owned.len()))
}

/// No vertex outside `adjacent` runs across `gap` (between `gap - 1` and
/// `gap`). Together with `gap` lying in `lo..=hi + 1` of the owned
/// predecessors this is where a new section for `u` fits.
fn gap_is_clear(q: &QNode, adjacent: &BTreeSet<Vertex>, gap: usize) -> bool {
    let (Some(left), Some(right)) = (
        gap.checked_sub(1).and_then(|j| q.section_bag(j)),
        q.section_bag(gap),
    ) else {
        return true;
    };
    let (small, large) = if left.len() <= right.len() {
        (left, right)
    } else {
        (right, left)
    };
    small
        .iter()
        .all(|v| adjacent.contains(v) || !large.contains(v))
}

/// Templates for `nSmall != nBig`
fn run(
    tree: &MpqTree,
    labels: &LabelingResult,
    path: &[PathNode],
    adjacent: &BTreeSet<Vertex>,
) -> Result<Result<Vec<Step>, Obstruction>, InvariantViolation> {
    let mut steps = Vec::with_capacity(path.len());

    let small = path[0].id;
    let base = match tree.node(small)?.kind() {
        NodeKind::P(p) if p.is_leaf() => Template::L2,
        NodeKind::P(_) => Template::P2,
        NodeKind::Q(q) => {
            let m = q.section_count();
            let (lo, hi) = shared_sections(q, labels.owned(small));
            if lo == 0 {
                Template::Q2 { gap: 0 }
            } else if hi + 1 == m {
                Template::Q2 { gap: m }
            } else {
                return Ok(Err(Obstruction::NoOuterGap { node: small }));
            }
        }
    };
    steps.push(Step {
        node: small,
        template: base,
    });

    let top = path.len() - 1;
    for (idx, step) in path.iter().enumerate().skip(1) {
        let template = match (tree.node(step.id)?.kind(), step.section) {
            (NodeKind::P(_), _) => Template::P3,
            (NodeKind::Q(q), Some(section)) => {
                let m = q.section_count();
                let side = if idx < top {
                    if section == 0 {
                        Some(Side::Left)
                    } else if section == m - 1 {
                        Some(Side::Right)
                    } else {
                        return Ok(Err(Obstruction::InteriorSection {
                            node: step.id,
                            section,
                        }));
                    }
                } else {
                    big_side(q, adjacent, section)
                };
                match side {
                    Some(side) => Template::Q3 { section, side },
                    None => {
                        return Ok(Err(Obstruction::BothSides {
                            node: step.id,
                            section,
                        }))
                    }
                }
            }
            (NodeKind::Q(_), None) => {
                return Err(InvariantViolation::TemplateMismatch {
                    template: "Q3",
                    node: step.id,
                    reason: "Q-node on the path without a path section".to_string(),
                })
            }
        };
        steps.push(Step {
            node: step.id,
            template,
        });
    }

    Ok(Ok(steps))
}

/// Side from which `u` can enter section `section` of `nBig`
fn big_side(q: &QNode, adjacent: &BTreeSet<Vertex>, section: usize) -> Option<Side> {
    let blocking: Vec<_> = q
        .section_bag(section)?
        .iter()
        .filter(|v| !adjacent.contains(v))
        .filter_map(|&v| q.span(v))
        .collect();

    if blocking.iter().all(|span| span.first == section) {
        Some(Side::Left)
    } else if blocking.iter().all(|span| span.last == section) {
        Some(Side::Right)
    } else {
        None
    }
}
