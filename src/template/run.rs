//! Run templates (`nSmall != nBig`)
//!
//! A run builds a `Fragment`: a chain of sections whose section 0 is the new
//! leaf `{u}`. `nSmall` opens the chain (L2, P2 or Q2 at an outer gap), every
//! node above folds itself into it (P3, Q3) and the chain becomes a Q-node
//! at `nBig`. Vertices spanning the whole chain are kept apart in `full` and
//! end up in a P-node wrapped around the Q-node.
//!
//! A Q-node on the path is never rebuilt: the chain is spliced into it at the
//! path section and only the spliced part, plus the vertices covering that
//! section, is touched.
//!
//! Consumed nodes are released only after materialisation so that no handle
//! of the path is reused while the run is in progress.

use super::{mismatch, new_leaf, p_node_mut, q_node_mut, set_parent, Partition};
use crate::graph::Vertex;
use crate::tree::{InvariantViolation, MpqTree, Node, NodeId, NodeKind, QNode};
use crate::validate::{Side, Step, Template};
use std::collections::{BTreeMap, BTreeSet};
use std::mem;

#[derive(Debug)]
struct Fragment {
    chain: QNode,
    full: BTreeSet<Vertex>,
}

impl Fragment {
    /// Two sections: the leaf of `u`, then `rest`
    fn open(leaf: NodeId, rest: NodeId, full: BTreeSet<Vertex>) -> Self {
        Self {
            chain: QNode::new(vec![leaf, rest], BTreeMap::new()),
            full,
        }
    }
}

/// Children and vertices that a splice moved into a Q-node
#[derive(Debug)]
struct Moved {
    children: Vec<NodeId>,
    vertices: Vec<Vertex>,
}

pub(super) fn apply(
    tree: &mut MpqTree,
    u: Vertex,
    adjacent: &BTreeSet<Vertex>,
    steps: &[Step],
) -> Result<(), InvariantViolation> {
    let (base, folds) = steps
        .split_first()
        .ok_or_else(|| mismatch(Template::P3, tree.root(), "empty run"))?;
    let (top, middle) = folds
        .split_last()
        .ok_or_else(|| mismatch(base.template, base.node, "run without nBig"))?;

    let mut consumed = Vec::new();
    let mut fragment = open(tree, u, adjacent, *base, &mut consumed)?;

    let mut below = base.node;
    for step in middle {
        fragment = match step.template {
            Template::P3 => fold_p(tree, adjacent, step.node, below, fragment)?,
            Template::Q3 { section, side } => {
                let mut chain = take_q(tree, step.node, step.template)?;
                splice(&mut chain, adjacent, step.node, section, side, below, fragment)?;
                if side == Side::Right {
                    chain.reverse();
                }
                Fragment {
                    chain,
                    full: BTreeSet::new(),
                }
            }
            other => return Err(mismatch(other, step.node, "not a fold template")),
        };
        consumed.push(step.node);
        below = step.node;
    }

    let big = top.node;
    match top.template {
        Template::P3 => {
            let fragment = fold_p(tree, adjacent, big, below, fragment)?;
            materialize(tree, big, fragment)?;
        }
        Template::Q3 { section, side } => {
            let mut chain = take_q(tree, big, top.template)?;
            let moved = splice(&mut chain, adjacent, big, section, side, below, fragment)?;
            tree.node_mut(big)?.kind = NodeKind::Q(chain);
            settle(tree, big, moved)?;
        }
        other => return Err(mismatch(other, big, "not a fold template")),
    }

    for id in consumed {
        tree.release(id)?;
    }
    Ok(())
}

/// Open the chain at `nSmall`
fn open(
    tree: &mut MpqTree,
    u: Vertex,
    adjacent: &BTreeSet<Vertex>,
    step: Step,
    consumed: &mut Vec<NodeId>,
) -> Result<Fragment, InvariantViolation> {
    let Step { node, template } = step;
    match template {
        Template::L2 => {
            // The leaf stays as the section right of u, keeping what u misses
            let p = p_node_mut(tree, node, template)?;
            let split = Partition::of(mem::take(&mut p.bag), adjacent);
            p.bag = split.non_adjacent;
            let leaf = new_leaf(tree, u);
            Ok(Fragment::open(leaf, node, split.adjacent))
        }

        Template::P2 => {
            let p = p_node_mut(tree, node, template)?;
            let split = Partition::of(mem::take(&mut p.bag), adjacent);
            let rest = if split.non_adjacent.is_empty() && p.children.len() == 1 {
                consumed.push(node);
                p.children[0]
            } else {
                p.bag = split.non_adjacent;
                node
            };
            let leaf = new_leaf(tree, u);
            Ok(Fragment::open(leaf, rest, split.adjacent))
        }

        Template::Q2 { gap } => {
            let mut chain = take_q(tree, node, template)?;
            if gap == chain.section_count() {
                chain.reverse();
            } else if gap != 0 {
                return Err(mismatch(template, node, "run must open at an outer gap"));
            }
            consumed.push(node);

            let leaf = new_leaf(tree, u);
            let at = chain
                .insert_sections(0, vec![leaf])
                .first()
                .copied()
                .ok_or_else(|| mismatch(template, node, "gap not opened"))?;
            for &v in adjacent {
                if chain.contains(v) {
                    chain.cover(v, at, at);
                }
            }
            Ok(Fragment {
                chain,
                full: BTreeSet::new(),
            })
        }

        other => Err(mismatch(other, node, "not an opening template")),
    }
}

/// P3: the path child becomes the chain, the other children follow it
fn fold_p(
    tree: &mut MpqTree,
    adjacent: &BTreeSet<Vertex>,
    node: NodeId,
    below: NodeId,
    mut fragment: Fragment,
) -> Result<Fragment, InvariantViolation> {
    let p = p_node_mut(tree, node, Template::P3)?;
    let split = Partition::of(mem::take(&mut p.bag), adjacent);
    let mut others = mem::take(&mut p.children);
    let before = others.len();
    others.retain(|&c| c != below);
    if others.len() + 1 != before {
        return Err(mismatch(Template::P3, node, "path child missing"));
    }

    let group = match others.len() {
        0 => None,
        1 => Some(others[0]),
        _ => {
            let group = tree.alloc(Node::p(BTreeSet::new(), others));
            tree.adopt(group)?;
            Some(group)
        }
    };

    let chain = &mut fragment.chain;
    let mut full = split.adjacent;
    match group {
        Some(group) => {
            let (near, far) = (chain.coord(0), chain.coord(chain.section_count() - 1));
            for v in mem::take(&mut fragment.full) {
                chain.cover(v, near, far);
            }
            chain.insert_sections(chain.section_count(), vec![group]);
        }
        None => full.extend(mem::take(&mut fragment.full)),
    }

    let (from, to) = (chain.coord(1), chain.coord(chain.section_count() - 1));
    for v in split.non_adjacent {
        chain.cover(v, from, to);
    }
    fragment.full = full;
    Ok(fragment)
}

/// Q3: the chain of `fragment` takes the place of section `section` of
/// `chain`, with `u` towards `side`. Returns what moved in.
fn splice(
    chain: &mut QNode,
    adjacent: &BTreeSet<Vertex>,
    node: NodeId,
    section: usize,
    side: Side,
    below: NodeId,
    fragment: Fragment,
) -> Result<Moved, InvariantViolation> {
    let template = Template::Q3 { section, side };
    if chain.section(section) != Some(below) {
        return Err(mismatch(template, node, "path child is not in the path section"));
    }
    let Fragment { chain: piece, full } = fragment;
    let k = piece.section_count();
    if k < 2 {
        return Err(mismatch(template, node, "chain shorter than two sections"));
    }

    let children: Vec<NodeId> = piece.sections().collect();
    let covering: Vec<Vertex> = chain
        .section_bag(section)
        .map(|bag| bag.iter().copied().collect())
        .unwrap_or_default();

    // coords[i]: coordinate of chain section i inside `chain`; the last one
    // reuses the path section
    let mut coords = match side {
        Side::Left => chain.insert_sections(section, children[..k - 1].to_vec()),
        Side::Right => {
            let reversed = children[..k - 1].iter().rev().copied().collect();
            let mut coords = chain.insert_sections(section + 1, reversed);
            coords.reverse();
            coords
        }
    };
    let path = match side {
        Side::Left => section + k - 1,
        Side::Right => section,
    };
    coords.push(chain.coord(path));
    if !chain.replace_child(below, children[k - 1]) {
        return Err(mismatch(template, node, "path child vanished"));
    }

    let (near, far) = (coords[0], coords[k - 1]);
    let mut vertices = Vec::with_capacity(piece.vertex_count() + full.len());
    for (v, span) in piece.spans() {
        chain.cover(v, coords[span.first], coords[span.last]);
        vertices.push(v);
    }
    for v in full {
        chain.cover(v, near, far);
        vertices.push(v);
    }
    for v in covering {
        let from = if adjacent.contains(&v) { near } else { coords[1] };
        chain.cover(v, from, far);
    }

    Ok(Moved { children, vertices })
}

/// Turn the chain into a Q-node at `nBig`, reusing its handle
fn materialize(
    tree: &mut MpqTree,
    big: NodeId,
    fragment: Fragment,
) -> Result<(), InvariantViolation> {
    let Fragment { chain, full } = fragment;
    let moved = Moved {
        children: chain.sections().collect(),
        vertices: chain.vertices().collect(),
    };

    if full.is_empty() {
        tree.node_mut(big)?.kind = NodeKind::Q(chain);
        settle(tree, big, moved)
    } else {
        let q = tree.alloc(Node::chain(chain));
        settle(tree, q, moved)?;
        for &v in &full {
            tree.relocate(v, big);
        }
        let p = p_node_mut(tree, big, Template::P3)?;
        p.bag = full;
        p.children = vec![q];
        set_parent(tree, q, big)
    }
}

/// Point moved children at `holder` and relocate moved vertices to it
fn settle(tree: &mut MpqTree, holder: NodeId, moved: Moved) -> Result<(), InvariantViolation> {
    for child in moved.children {
        set_parent(tree, child, holder)?;
    }
    for v in moved.vertices {
        tree.relocate(v, holder);
    }
    Ok(())
}

/// Move the Q-node content out of `node`, leaving an empty P-node behind
fn take_q(tree: &mut MpqTree, node: NodeId, template: Template) -> Result<QNode, InvariantViolation> {
    let q = mem::take(q_node_mut(tree, node, template)?);
    tree.node_mut(node)?.kind = NodeKind::P(Default::default());
    Ok(q)
}

#[cfg(test)]
mod tests {
    use super::super::tests::{cliques, insert};
    use crate::tree::{MpqTree, NodeKind};
    use crate::validate::{Side, Template};
    use std::collections::BTreeSet;

    /// Path 1 - 2 - 3: P{2} above leaf{1} and leaf{3}
    fn path_tree() -> MpqTree {
        let mut tree = MpqTree::new();
        insert(&mut tree, 1, &[]);
        insert(&mut tree, 2, &[1]);
        insert(&mut tree, 3, &[2]);
        tree
    }

    #[test]
    fn test_leaf_run_builds_q_node() {
        let mut tree = path_tree();
        assert_eq!(insert(&mut tree, 4, &[3]), vec![Template::L2, Template::P3]);

        let q = tree.locate(2).unwrap();
        assert!(matches!(tree.node(q).unwrap().kind(), NodeKind::Q(_)));
        assert_eq!(tree.locate(3).unwrap(), q);
        assert_eq!(
            cliques(&tree),
            vec![
                BTreeSet::from([1, 2]),
                BTreeSet::from([2, 3]),
                BTreeSet::from([3, 4]),
            ]
        );
    }

    #[test]
    fn test_q_node_extends_at_its_end() {
        let mut tree = path_tree();
        insert(&mut tree, 4, &[3]);
        // Sections run from 4 to 1; 5 hangs off the end holding 1
        let templates = insert(&mut tree, 5, &[1]);
        assert_eq!(templates.len(), 2);
        assert!(matches!(templates[1], Template::Q3 { side: Side::Right, .. }));
        assert_eq!(
            cliques(&tree),
            vec![
                BTreeSet::from([1, 2]),
                BTreeSet::from([1, 5]),
                BTreeSet::from([2, 3]),
                BTreeSet::from([3, 4]),
            ]
        );
    }

    #[test]
    fn test_path_grows_at_both_ends_in_place() {
        let mut tree = path_tree();
        insert(&mut tree, 4, &[3]);
        let q = tree.locate(2).unwrap();

        for (u, end) in [(5, 1), (6, 4), (7, 5), (8, 6)] {
            let templates = insert(&mut tree, u, &[end]);
            assert_eq!(templates[0], Template::L2);
            assert!(matches!(templates[1], Template::Q3 { .. }));
            assert_eq!(tree.locate(end).unwrap(), q, "Q-node keeps its handle");
        }

        let node = tree.node(q).unwrap();
        assert_eq!(node.child_count(), 7);
        assert_eq!(
            cliques(&tree),
            vec![
                BTreeSet::from([1, 2]),
                BTreeSet::from([1, 5]),
                BTreeSet::from([2, 3]),
                BTreeSet::from([3, 4]),
                BTreeSet::from([4, 6]),
                BTreeSet::from([5, 7]),
                BTreeSet::from([6, 8]),
            ]
        );
    }

    #[test]
    fn test_wrapper_p_node_keeps_universal_vertex() {
        // 1 is adjacent to everything, the rest is the path 2 - 3 - 4
        let mut tree = MpqTree::new();
        insert(&mut tree, 1, &[]);
        insert(&mut tree, 2, &[1]);
        insert(&mut tree, 3, &[1, 2]);
        insert(&mut tree, 4, &[1, 3]);

        let root_child = tree.node(tree.root()).unwrap().child(0).unwrap();
        assert_eq!(tree.locate(1).unwrap(), root_child);
        assert_eq!(
            cliques(&tree),
            vec![
                BTreeSet::from([1, 2, 3]),
                BTreeSet::from([1, 3, 4]),
            ]
        );

        // 5 sees 1 and 4: P{1} now wraps a Q-node
        insert(&mut tree, 5, &[1, 4]);
        assert_eq!(tree.locate(1).unwrap(), root_child);
        assert_eq!(
            cliques(&tree),
            vec![
                BTreeSet::from([1, 2, 3]),
                BTreeSet::from([1, 3, 4]),
                BTreeSet::from([1, 4, 5]),
            ]
        );
    }
}
