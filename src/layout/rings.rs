use std::collections::BTreeSet;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::layout::priority::ring_priority;
use crate::mol::Mol;
use crate::rings::Sssr;

/// One perceived ring, frozen for the duration of a layout run.
///
/// Atoms stay in the cyclic order the perception produced; bonds are the
/// matching consecutive-pair edges. The priority is assigned after atom
/// priorities converge and orders ring placement inside a ring system.
#[derive(Debug, Clone)]
pub(crate) struct RingInfo {
    atoms: Vec<NodeIndex>,
    bonds: Vec<EdgeIndex>,
    priority: u64,
}

impl RingInfo {
    /// Member atoms in cyclic adjacency order.
    pub fn atoms(&self) -> &[NodeIndex] {
        &self.atoms
    }

    pub fn shares_bond(&self, other: &RingInfo) -> bool {
        self.bonds.iter().any(|b| other.bonds.contains(b))
    }
}

/// Builds one [`RingInfo`] per perceived ring.
pub(crate) fn build_rings<A, B>(mol: &Mol<A, B>, sssr: &Sssr, priorities: &[u64]) -> Vec<RingInfo> {
    (0..sssr.num_rings())
        .map(|i| {
            let atoms = sssr.rings()[i].clone();
            let bonds = sssr.ring_bonds(i, mol);
            let priority = ring_priority(&atoms, priorities);
            RingInfo {
                atoms,
                bonds,
                priority,
            }
        })
        .collect()
}

/// Rings merged into one rigid body because they share at least one bond.
#[derive(Debug, Clone)]
pub(crate) struct RingSystem {
    /// Member rings, highest priority first.
    pub rings: Vec<RingInfo>,
    /// Union of member atoms, sorted.
    pub atoms: Vec<NodeIndex>,
    /// Union of member bonds, sorted.
    pub bonds: Vec<EdgeIndex>,
}

impl RingSystem {
    fn new(mut rings: Vec<RingInfo>) -> Self {
        rings.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.atoms[0].cmp(&b.atoms[0]))
        });
        let atoms: BTreeSet<NodeIndex> = rings.iter().flat_map(|r| r.atoms.iter().copied()).collect();
        let bonds: BTreeSet<EdgeIndex> = rings.iter().flat_map(|r| r.bonds.iter().copied()).collect();
        Self {
            rings,
            atoms: atoms.into_iter().collect(),
            bonds: bonds.into_iter().collect(),
        }
    }

    pub fn contains_atom(&self, atom: NodeIndex) -> bool {
        self.atoms.binary_search(&atom).is_ok()
    }

    pub fn contains_bond(&self, bond: EdgeIndex) -> bool {
        self.bonds.binary_search(&bond).is_ok()
    }

    pub fn priority(&self) -> u64 {
        self.rings
            .iter()
            .fold(0u64, |acc, r| acc.wrapping_add(r.priority))
    }

    /// Ring neighbors of `atom` inside this system, sorted and deduplicated.
    pub fn internal_neighbors(&self, atom: NodeIndex) -> Vec<NodeIndex> {
        let mut neighbors = BTreeSet::new();
        for ring in &self.rings {
            let len = ring.atoms.len();
            for (i, &a) in ring.atoms.iter().enumerate() {
                if a == atom {
                    neighbors.insert(ring.atoms[(i + 1) % len]);
                    neighbors.insert(ring.atoms[(i + len - 1) % len]);
                }
            }
        }
        neighbors.into_iter().collect()
    }
}

/// A spiro junction: two ring systems sharing exactly one atom and no bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SpiroLink {
    pub systems: [usize; 2],
    pub atom: NodeIndex,
}

/// Merges rings into ring systems and discovers spiro junctions.
///
/// A system grows from an unmerged ring by absorbing any remaining ring
/// whose bond set intersects the system's, repeated to a fixed point.
/// Atom-only intersections between two finished systems become spiro
/// links keyed by the shared atom.
pub(crate) fn merge_ring_systems(rings: Vec<RingInfo>) -> (Vec<RingSystem>, Vec<SpiroLink>) {
    let mut remaining = rings;
    let mut systems: Vec<RingSystem> = Vec::new();

    while !remaining.is_empty() {
        let mut members = vec![remaining.remove(0)];
        let mut grew = true;
        while grew {
            grew = false;
            let mut i = 0;
            while i < remaining.len() {
                if members.iter().any(|m| m.shares_bond(&remaining[i])) {
                    members.push(remaining.remove(i));
                    grew = true;
                } else {
                    i += 1;
                }
            }
        }
        systems.push(RingSystem::new(members));
    }

    let mut spiro = Vec::new();
    for i in 0..systems.len() {
        for j in (i + 1)..systems.len() {
            for &atom in &systems[i].atoms {
                if systems[j].contains_atom(atom) {
                    spiro.push(SpiroLink {
                        systems: [i, j],
                        atom,
                    });
                }
            }
        }
    }

    (systems, spiro)
}
