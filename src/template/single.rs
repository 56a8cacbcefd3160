//! Single-node templates (`nSmall == nBig`)

use super::{mismatch, new_leaf, p_node_mut, q_node_mut, set_parent, Partition};
use crate::graph::Vertex;
use crate::tree::{InvariantViolation, MpqTree, Node, NodeKind};
use crate::validate::{Step, Template};
use std::collections::BTreeSet;
use std::mem;

pub(super) fn apply(
    tree: &mut MpqTree,
    u: Vertex,
    adjacent: &BTreeSet<Vertex>,
    step: Step,
) -> Result<(), InvariantViolation> {
    let Step { node, template } = step;
    match template {
        Template::L1 => {
            p_node_mut(tree, node, template)?.bag.insert(u);
            tree.relocate(u, node);
        }

        Template::L2 => {
            let p = p_node_mut(tree, node, template)?;
            let split = Partition::of(mem::take(&mut p.bag), adjacent);
            p.bag = split.adjacent;

            let rest = tree.alloc(Node::leaf(split.non_adjacent));
            tree.adopt(rest)?;
            let leaf = new_leaf(tree, u);
            p_node_mut(tree, node, template)?.children = vec![rest, leaf];
            set_parent(tree, rest, node)?;
            set_parent(tree, leaf, node)?;
        }

        Template::P1 => {
            let leaf = new_leaf(tree, u);
            if node == tree.root() {
                tree.attach_component(leaf)?;
            } else {
                p_node_mut(tree, node, template)?.children.push(leaf);
                set_parent(tree, leaf, node)?;
            }
        }

        Template::P2 => {
            let p = p_node_mut(tree, node, template)?;
            let split = Partition::of(mem::take(&mut p.bag), adjacent);
            let children = mem::take(&mut p.children);
            p.bag = split.adjacent;

            let inner = tree.alloc(Node::p(split.non_adjacent, children));
            tree.adopt(inner)?;
            let leaf = new_leaf(tree, u);
            p_node_mut(tree, node, template)?.children = vec![inner, leaf];
            set_parent(tree, inner, node)?;
            set_parent(tree, leaf, node)?;
        }

        Template::Q1 { section } => {
            let child = q_node_mut(tree, node, template)?
                .section(section)
                .ok_or_else(|| mismatch(template, node, "no such section"))?;
            let empty_bag = match tree.node(child)?.kind() {
                NodeKind::P(p) if p.bag().is_empty() => Some(p.is_leaf()),
                _ => None,
            };
            match empty_bag {
                Some(true) => {
                    p_node_mut(tree, child, template)?.bag.insert(u);
                    tree.relocate(u, child);
                }
                Some(false) => {
                    let leaf = new_leaf(tree, u);
                    p_node_mut(tree, child, template)?.children.push(leaf);
                    set_parent(tree, leaf, child)?;
                }
                None => {
                    let leaf = new_leaf(tree, u);
                    let holder = tree.alloc(Node::p(BTreeSet::new(), vec![child, leaf]));
                    tree.adopt(holder)?;
                    tree.replace_child(node, child, holder)?;
                }
            }
        }

        Template::Q2 { gap } => {
            let leaf = new_leaf(tree, u);
            let q = q_node_mut(tree, node, template)?;
            let coords = q.insert_sections(gap, vec![leaf]);
            let at = coords
                .first()
                .copied()
                .ok_or_else(|| mismatch(template, node, "gap not opened"))?;
            for &v in adjacent {
                if q.contains(v) {
                    q.cover(v, at, at);
                }
            }
            set_parent(tree, leaf, node)?;
        }

        Template::P3 | Template::Q3 { .. } => {
            return Err(mismatch(template, node, "run template in a single-node update"));
        }
    }
    Ok(())
}
