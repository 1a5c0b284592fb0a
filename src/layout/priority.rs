use petgraph::graph::NodeIndex;

use crate::mol::Mol;
use crate::rings::Sssr;

/// Extended-connectivity priorities for every atom of a molecule.
///
/// Ring atoms seed at 3, chain atoms at 1, then each round replaces a
/// priority with `3 * own + sum(neighbors)`. Refinement stops as soon as
/// the number of distinct values stops increasing, so the result is the
/// coarsest stable partition reachable from the seed. Higher values mean
/// more ring-embedded, more connected atoms.
pub(crate) fn atom_priorities<A, B>(mol: &Mol<A, B>, sssr: &Sssr) -> Vec<u64> {
    let n = mol.atom_count();
    let mut priorities: Vec<u64> = (0..n)
        .map(|i| {
            if sssr.is_ring_atom(NodeIndex::new(i)) {
                3
            } else {
                1
            }
        })
        .collect();
    if n == 0 {
        return priorities;
    }

    let mut prev_distinct = count_distinct(&priorities);
    loop {
        let mut next = vec![0u64; n];
        for node in mol.atoms() {
            let i = node.index();
            // Wrapping keeps long refinements deterministic instead of
            // panicking once values outgrow u64.
            let mut p = priorities[i].wrapping_mul(3);
            for neighbor in mol.neighbors(node) {
                p = p.wrapping_add(priorities[neighbor.index()]);
            }
            next[i] = p;
        }
        let distinct = count_distinct(&next);
        if distinct <= prev_distinct {
            return priorities;
        }
        priorities = next;
        prev_distinct = distinct;
    }
}

/// A ring's priority is the plain sum of its member atom priorities.
pub(crate) fn ring_priority(ring: &[NodeIndex], priorities: &[u64]) -> u64 {
    ring.iter()
        .fold(0u64, |acc, a| acc.wrapping_add(priorities[a.index()]))
}

fn count_distinct(values: &[u64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}
