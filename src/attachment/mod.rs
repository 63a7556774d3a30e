//! Attachment graph
//!
//! - Holder-first ordering of every active character (petgraph toposort)
//! - Cycle and depth checks run before an attach is accepted
//! - Consistency checks between `attached_to`, `holding` and pack chains
//! - Held and packed characters follow their holders after the step

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::character::{CharacterPool, ChrRef};
use crate::matrix::{matrix_translation, MatrixInputs};
use crate::simulation::Simulation;

/// Edges of the graph: who carries whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Held,
    Packed,
}

/// Broken relation found by [`verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// `attached_to` names a character that is gone
    HolderMissing { item: ChrRef },
    /// `attached_to` is set but no hand of the holder points back
    NotHeld { item: ChrRef, holder: ChrRef },
    /// A hand points at a character attached elsewhere, or not at all
    HeldNotAttached { holder: ChrRef, item: ChrRef },
    /// Held and packed at once
    HeldAndPacked { item: ChrRef },
    /// Holder chain longer than the cap, or a loop
    TooDeep { item: ChrRef },
}

/// Graph of all characters in the pool with holder → held and
/// container → packed edges.
pub fn build_graph(pool: &CharacterPool) -> (DiGraph<ChrRef, Link>, HashMap<ChrRef, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();
    for r in pool.keys() {
        nodes.insert(r, graph.add_node(r));
    }
    for (r, c) in pool.iter() {
        let edges = [
            (c.attached_to, Link::Held),
            (c.pack.container.filter(|_| c.pack.is_packed), Link::Packed),
        ];
        for (from, link) in edges {
            if let Some(&from) = from.as_ref().and_then(|f| nodes.get(f)) {
                graph.add_edge(from, nodes[&r], link);
            }
        }
    }
    (graph, nodes)
}

/// Every character, holders before what they carry. A loop in the graph
/// falls back to pool order.
pub fn holder_first_order(pool: &CharacterPool) -> Vec<ChrRef> {
    let (graph, _) = build_graph(pool);
    match toposort(&graph, None) {
        Ok(order) => order.into_iter().map(|n| graph[n]).collect(),
        Err(cycle) => {
            tracing::warn!(node = ?graph[cycle.node_id()], "attachment cycle, using pool order");
            pool.keys()
        }
    }
}

/// Whether holding `item` by `holder` would close a loop or make a holder
/// chain longer than `max_depth`.
pub fn would_create_cycle(pool: &CharacterPool, item: ChrRef, holder: ChrRef, max_depth: usize) -> bool {
    let mut current = Some(holder);
    let mut depth = 0;
    while let Some(r) = current {
        if r == item {
            return true;
        }
        depth += 1;
        if depth > max_depth {
            return true;
        }
        current = pool.get(r).and_then(|c| c.attached_to);
    }
    // what the item already carries hangs below it too
    depth + carried_depth(pool, item, max_depth) > max_depth
}

/// Height of the tree of characters carried by `r`.
fn carried_depth(pool: &CharacterPool, r: ChrRef, budget: usize) -> usize {
    if budget == 0 {
        return 0;
    }
    pool.get(r)
        .map(|c| {
            c.held_items()
                .map(|h| 1 + carried_depth(pool, h, budget - 1))
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(0)
}

/// Check that hands and holders agree.
pub fn verify(pool: &CharacterPool, max_depth: usize) -> Vec<Violation> {
    let mut found = Vec::new();
    for (r, c) in pool.iter() {
        if let Some(holder) = c.attached_to {
            match pool.get(holder) {
                None => found.push(Violation::HolderMissing { item: r }),
                Some(h) if !h.held_items().any(|i| i == r) => {
                    found.push(Violation::NotHeld { item: r, holder })
                }
                Some(_) => {}
            }
            if c.pack.is_packed {
                found.push(Violation::HeldAndPacked { item: r });
            }
            let mut depth = 0;
            let mut up = c.attached_to;
            while let Some(u) = up {
                depth += 1;
                if depth > max_depth || u == r {
                    found.push(Violation::TooDeep { item: r });
                    break;
                }
                up = pool.get(u).and_then(|h| h.attached_to);
            }
        }
        for item in c.held_items() {
            if pool.get(item).and_then(|i| i.attached_to) != Some(r) {
                found.push(Violation::HeldNotAttached { holder: r, item });
            }
        }
    }
    found
}

impl Simulation {
    /// Move held and packed characters onto their holders.
    pub fn keep_weapons_with_holders(&mut self) {
        for r in holder_first_order(&self.chars) {
            let Some(chr) = self.chars.active(r) else {
                continue;
            };

            if let Some(holder) = chr.attached_to {
                let Some(h) = self.chars.get(holder) else {
                    continue;
                };
                let (holder_pos, facing) = (h.pos, h.ori.facing_z);
                let cache = &chr.inst.matrix_cache;
                let gripped = cache.valid
                    && cache.matrix_valid
                    && matches!(cache.inputs, Some(MatrixInputs::Weapon(_)));
                let pos = if gripped {
                    matrix_translation(&chr.inst.matrix)
                } else {
                    holder_pos
                };
                if let Some(chr) = self.chars.active_mut(r) {
                    chr.pos = pos;
                    chr.ori.facing_z = facing;
                }
            } else if chr.pack.is_packed {
                let Some(pos) = chr.pack.container.and_then(|c| self.chars.get(c)).map(|c| c.pos) else {
                    continue;
                };
                if let Some(chr) = self.chars.active_mut(r) {
                    chr.pos = pos;
                }
            }
        }
    }

    /// Broken links in the current state; empty when consistent.
    pub fn verify_attachments(&self) -> Vec<Violation> {
        verify(&self.chars, crate::constants::MAX_ATTACH_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{Character, Team};
    use crate::profile::{CharacterProfile, ProfileId};
    use bevy::math::Vec3;

    fn pool_with(n: usize) -> (CharacterPool, Vec<ChrRef>) {
        let mut pool = CharacterPool::default();
        let refs = (0..n)
            .map(|_| {
                pool.insert(Character::from_profile(
                    ProfileId(0),
                    &CharacterProfile::default(),
                    Vec3::ZERO,
                    0,
                    Team::GOOD,
                ))
            })
            .collect();
        (pool, refs)
    }

    fn hold(pool: &mut CharacterPool, holder: ChrRef, item: ChrRef, slot: usize) {
        pool.get_mut(item).unwrap().attached_to = Some(holder);
        pool.get_mut(holder).unwrap().holding[slot] = Some(item);
    }

    #[test]
    fn test_holders_come_first() {
        let (mut pool, r) = pool_with(3);
        // r2 holds r0, r0 holds r1
        hold(&mut pool, r[2], r[0], 0);
        hold(&mut pool, r[0], r[1], 0);
        let order = holder_first_order(&pool);
        let at = |x| order.iter().position(|&o| o == x).unwrap();
        assert!(at(r[2]) < at(r[0]));
        assert!(at(r[0]) < at(r[1]));
    }

    #[test]
    fn test_cycle_is_refused() {
        let (mut pool, r) = pool_with(3);
        hold(&mut pool, r[1], r[0], 0);
        hold(&mut pool, r[2], r[1], 0);
        assert!(would_create_cycle(&pool, r[2], r[0], 8));
        assert!(would_create_cycle(&pool, r[0], r[0], 8));
    }

    #[test]
    fn test_depth_cap() {
        let (mut pool, r) = pool_with(5);
        for i in 0..3 {
            hold(&mut pool, r[i + 1], r[i], 0);
        }
        // r3 -> r2 -> r1 -> r0; putting r3 in r4's hand makes four levels
        assert!(!would_create_cycle(&pool, r[3], r[4], 4));
        assert!(would_create_cycle(&pool, r[3], r[4], 3));
    }

    #[test]
    fn test_verify_reports_one_sided_links() {
        let (mut pool, r) = pool_with(2);
        assert!(verify(&pool, 8).is_empty());
        pool.get_mut(r[0]).unwrap().attached_to = Some(r[1]);
        assert_eq!(verify(&pool, 8), vec![Violation::NotHeld { item: r[0], holder: r[1] }]);
        pool.get_mut(r[1]).unwrap().holding[1] = Some(r[0]);
        assert!(verify(&pool, 8).is_empty());
    }
}
