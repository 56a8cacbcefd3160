//! Template rewriter
//!
//! Applies a validated `PathPlan` to the tree. A plan with one step is a
//! single-node update (L1, L2, P1, P2, Q1, Q2); a longer plan is a run that
//! opens a chain of sections at `nSmall`, folds every node above it into the
//! chain and materialises the result at `nBig`.
//!
//! Every step is checked against the tree before anything is modified, so a
//! mismatch leaves the tree untouched.

mod run;
mod single;

use crate::graph::Vertex;
use crate::tree::{InvariantViolation, MpqTree, Node, NodeId, NodeKind, PNode, QNode};
use crate::validate::{PathPlan, Template};
use std::collections::BTreeSet;
use tracing::debug;

/// Bag split against the predecessors of the new vertex
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Vertices adjacent to the new vertex
    pub adjacent: BTreeSet<Vertex>,
    /// Vertices not adjacent to it
    pub non_adjacent: BTreeSet<Vertex>,
}

impl Partition {
    /// Split `bag` by membership in `adjacent`
    pub fn of(bag: BTreeSet<Vertex>, adjacent: &BTreeSet<Vertex>) -> Self {
        let (adjacent, non_adjacent) = bag.into_iter().partition(|v| adjacent.contains(v));
        Self {
            adjacent,
            non_adjacent,
        }
    }
}

/// Insert `u`, whose predecessors are `adjacent`, following `plan`
pub fn apply(
    tree: &mut MpqTree,
    u: Vertex,
    adjacent: &BTreeSet<Vertex>,
    plan: &PathPlan,
) -> Result<(), InvariantViolation> {
    if tree.locator().contains(u) {
        return Err(InvariantViolation::AlreadyInserted { vertex: u });
    }
    precheck(tree, plan)?;

    for step in plan.steps() {
        debug!(vertex = u, node = %step.node, template = %step.template, "template");
    }

    match plan.steps() {
        [step] => single::apply(tree, u, adjacent, *step),
        steps => run::apply(tree, u, adjacent, steps),
    }
}

/// Check that every step names a node of the kind its template expects
fn precheck(tree: &MpqTree, plan: &PathPlan) -> Result<(), InvariantViolation> {
    let mut below: Option<NodeId> = None;
    for step in plan.steps() {
        let node = tree.node(step.node)?;
        let fits = match (step.template, node.kind()) {
            (Template::L1 | Template::L2, NodeKind::P(p)) => p.is_leaf(),
            (Template::P1 | Template::P2 | Template::P3, NodeKind::P(_)) => true,
            (Template::Q1 { section }, NodeKind::Q(q)) => section < q.section_count(),
            (Template::Q2 { gap }, NodeKind::Q(q)) => {
                let m = q.section_count();
                gap == 0 || gap == m || (plan.is_single() && gap < m)
            }
            (Template::Q3 { section, .. }, NodeKind::Q(q)) => {
                below.is_some() && q.section(section) == below
            }
            _ => false,
        };
        if !fits {
            return Err(mismatch(step.template, step.node, "node kind does not fit"));
        }
        if let Some(child) = below {
            if tree.node(child)?.parent() != Some(step.node) {
                return Err(mismatch(
                    step.template,
                    step.node,
                    &format!("{} is not a child", child),
                ));
            }
        }
        below = Some(step.node);
    }
    Ok(())
}

fn mismatch(template: Template, node: NodeId, reason: &str) -> InvariantViolation {
    InvariantViolation::TemplateMismatch {
        template: template.name(),
        node,
        reason: reason.to_string(),
    }
}

fn p_node_mut(
    tree: &mut MpqTree,
    id: NodeId,
    template: Template,
) -> Result<&mut PNode, InvariantViolation> {
    match &mut tree.node_mut(id)?.kind {
        NodeKind::P(p) => Ok(p),
        NodeKind::Q(_) => Err(mismatch(template, id, "expected a P-node")),
    }
}

fn q_node_mut(
    tree: &mut MpqTree,
    id: NodeId,
    template: Template,
) -> Result<&mut QNode, InvariantViolation> {
    match &mut tree.node_mut(id)?.kind {
        NodeKind::Q(q) => Ok(q),
        NodeKind::P(_) => Err(mismatch(template, id, "expected a Q-node")),
    }
}

/// Fresh leaf holding only `u`
fn new_leaf(tree: &mut MpqTree, u: Vertex) -> NodeId {
    let leaf = tree.alloc(Node::leaf(BTreeSet::from([u])));
    tree.relocate(u, leaf);
    leaf
}

fn set_parent(tree: &mut MpqTree, child: NodeId, parent: NodeId) -> Result<(), InvariantViolation> {
    tree.node_mut(child)?.parent = Some(parent);
    Ok(())
}
