use std::collections::{BTreeSet, VecDeque};

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::bond::BondStereo;
use crate::layout::ring_geometry::RingGeometry;
use crate::layout::rings::{RingSystem, SpiroLink};
use crate::layout::LayoutParams;
use crate::mol::Mol;
use crate::traits::HasBondStereo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct EdgeId(pub usize);

/// The two flavors of layout node: a single non-ring atom, or a merged ring
/// system carrying its own precomputed local geometry.
#[derive(Debug)]
pub(crate) enum NodeKind {
    Atom(NodeIndex),
    RingSystem(RingGeometry),
}

#[derive(Debug)]
pub(crate) struct LayoutNode {
    pub priority: u64,
    pub chain_id: u32,
    pub parent_edge: Option<EdgeId>,
    pub edges: Vec<EdgeId>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeKind {
    Bond(EdgeIndex),
    /// Virtual link between two ring systems sharing one atom and no bond.
    Spiro,
}

/// A drawn cis/trans requirement on a bond edge: the two reference atoms
/// must land on the same side (cis) or opposite sides (trans) of the bond.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StereoConstraint {
    pub cis: bool,
    pub refs: [NodeIndex; 2],
}

#[derive(Debug)]
pub(crate) struct LayoutEdge {
    pub nodes: [NodeId; 2],
    /// Attachment atom on each node's side; both entries are the shared
    /// atom for a spiro edge.
    pub atoms: [NodeIndex; 2],
    pub kind: EdgeKind,
    pub stereo: Option<StereoConstraint>,
    pub traversed: bool,
}

/// Spanning tree over the node-contraction of one connected component.
///
/// Cycles inside a ring system are absorbed into its `RingSystemNode`;
/// every remaining bond (and spiro junction) between two nodes is exactly
/// one edge. Parent edges are assigned breadth-first from the
/// highest-priority root.
#[derive(Debug)]
pub(crate) struct LayoutTree {
    nodes: Vec<LayoutNode>,
    edges: Vec<LayoutEdge>,
    root: NodeId,
}

impl LayoutTree {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &LayoutNode {
        &self.nodes[id.0]
    }

    pub fn edge(&self, id: EdgeId) -> &LayoutEdge {
        &self.edges[id.0]
    }

    pub fn edges(&self) -> &[LayoutEdge] {
        &self.edges
    }

    /// Attachment atoms of `edge` as seen from `node`: `(own side, far side)`.
    pub fn attach(&self, edge: EdgeId, node: NodeId) -> (NodeIndex, NodeIndex) {
        let e = &self.edges[edge.0];
        if e.nodes[0] == node {
            (e.atoms[0], e.atoms[1])
        } else {
            (e.atoms[1], e.atoms[0])
        }
    }

    /// Tree children of `node`, ordered chain-continuation first, then by
    /// descending priority, then by node id.
    pub fn children_of(&self, node: NodeId) -> Vec<(EdgeId, NodeId)> {
        let mut children: Vec<(EdgeId, NodeId)> = self.nodes[node.0]
            .edges
            .iter()
            .filter_map(|&eid| {
                let e = &self.edges[eid.0];
                let other = if e.nodes[0] == node { e.nodes[1] } else { e.nodes[0] };
                (self.nodes[other.0].parent_edge == Some(eid)).then_some((eid, other))
            })
            .collect();
        let chain = self.nodes[node.0].chain_id;
        children.sort_by(|&(_, a), &(_, b)| {
            let na = &self.nodes[a.0];
            let nb = &self.nodes[b.0];
            (nb.chain_id == chain)
                .cmp(&(na.chain_id == chain))
                .then(nb.priority.cmp(&na.priority))
                .then(a.0.cmp(&b.0))
        });
        children
    }
}

/// Builds the layout tree for one connected component.
///
/// `systems` and `spiro` must already be restricted to this component, with
/// spiro links re-indexed into `systems`.
pub(crate) fn build_tree<A, B: HasBondStereo>(
    mol: &Mol<A, B>,
    component: &[NodeIndex],
    systems: Vec<RingSystem>,
    spiro: &[SpiroLink],
    priorities: &[u64],
    params: &LayoutParams,
) -> LayoutTree {
    let mut nodes: Vec<LayoutNode> = Vec::new();
    let mut owner: Vec<Option<NodeId>> = vec![None; mol.atom_count()];

    for system in systems {
        let id = NodeId(nodes.len());
        for &a in &system.atoms {
            // A spiro-shared atom stays owned by the first system.
            if owner[a.index()].is_none() {
                owner[a.index()] = Some(id);
            }
        }
        let priority = system.priority();
        nodes.push(LayoutNode {
            priority,
            chain_id: 0,
            parent_edge: None,
            edges: Vec::new(),
            kind: NodeKind::RingSystem(RingGeometry::build(system, params)),
        });
    }
    let ring_node_count = nodes.len();

    for &a in component {
        if owner[a.index()].is_none() {
            let id = NodeId(nodes.len());
            owner[a.index()] = Some(id);
            nodes.push(LayoutNode {
                priority: priorities[a.index()],
                chain_id: 0,
                parent_edge: None,
                edges: Vec::new(),
                kind: NodeKind::Atom(a),
            });
        }
    }

    let in_component = {
        let mut flags = vec![false; mol.atom_count()];
        for &a in component {
            flags[a.index()] = true;
        }
        flags
    };

    let mut edges: Vec<LayoutEdge> = Vec::new();
    for bond in mol.bonds() {
        let (u, v) = match mol.bond_endpoints(bond) {
            Some(pair) => pair,
            None => continue,
        };
        if !in_component[u.index()] || !in_component[v.index()] {
            continue;
        }
        let internal = nodes[..ring_node_count].iter().any(|n| match &n.kind {
            NodeKind::RingSystem(g) => g.system().contains_bond(bond),
            NodeKind::Atom(_) => false,
        });
        if internal {
            continue;
        }
        let (na, nb) = match (owner[u.index()], owner[v.index()]) {
            (Some(a), Some(b)) if a != b => (a, b),
            _ => continue,
        };
        let stereo = match mol.bond(bond).bond_stereo() {
            BondStereo::Cis(a, b) => Some(StereoConstraint { cis: true, refs: [a, b] }),
            BondStereo::Trans(a, b) => Some(StereoConstraint { cis: false, refs: [a, b] }),
            BondStereo::None | BondStereo::Either => None,
        };
        let id = EdgeId(edges.len());
        edges.push(LayoutEdge {
            nodes: [na, nb],
            atoms: [u, v],
            kind: EdgeKind::Bond(bond),
            stereo,
            traversed: false,
        });
        nodes[na.0].edges.push(id);
        nodes[nb.0].edges.push(id);
    }

    for link in spiro {
        let (na, nb) = (NodeId(link.systems[0]), NodeId(link.systems[1]));
        let id = EdgeId(edges.len());
        edges.push(LayoutEdge {
            nodes: [na, nb],
            atoms: [link.atom, link.atom],
            kind: EdgeKind::Spiro,
            stereo: None,
            traversed: false,
        });
        nodes[na.0].edges.push(id);
        nodes[nb.0].edges.push(id);
    }

    assign_chain_ids(&mut nodes, &edges, ring_node_count);

    let root = nodes
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| a.priority.cmp(&b.priority).then(ib.cmp(ia)))
        .map(|(i, _)| NodeId(i))
        .unwrap_or(NodeId(0));

    if !nodes.is_empty() {
        let mut queue = VecDeque::new();
        queue.push_back(root);
        while let Some(current) = queue.pop_front() {
            let incident = nodes[current.0].edges.clone();
            for eid in incident {
                let other = {
                    let e = &edges[eid.0];
                    if e.nodes[0] == current { e.nodes[1] } else { e.nodes[0] }
                };
                if other == root || nodes[other.0].parent_edge.is_some() || edges[eid.0].traversed {
                    continue;
                }
                edges[eid.0].traversed = true;
                nodes[other.0].parent_edge = Some(eid);
                queue.push_back(other);
            }
        }
    }

    LayoutTree { nodes, edges, root }
}

/// Every ring-system node gets its own chain id; acyclic atoms are grouped
/// by repeatedly extracting the longest simple path through unassigned atom
/// nodes (ties broken by larger priority sum) and numbering its members
/// together.
fn assign_chain_ids(nodes: &mut [LayoutNode], edges: &[LayoutEdge], ring_node_count: usize) {
    let mut next: u32 = 0;
    for node in nodes.iter_mut().take(ring_node_count) {
        node.chain_id = next;
        next += 1;
    }

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for e in edges {
        let (a, b) = (e.nodes[0].0, e.nodes[1].0);
        if a >= ring_node_count && b >= ring_node_count {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
    }

    let mut unassigned: BTreeSet<usize> = (ring_node_count..nodes.len()).collect();
    while !unassigned.is_empty() {
        let path = longest_chain(&unassigned, &adjacency, nodes);
        for &i in &path {
            nodes[i].chain_id = next;
            unassigned.remove(&i);
        }
        next += 1;
    }
}

/// Longest simple path through `unassigned` atom nodes. The non-ring
/// subgraph is a forest, so the path between any two nodes is unique and a
/// DFS from each start visits each node once.
fn longest_chain(
    unassigned: &BTreeSet<usize>,
    adjacency: &[Vec<usize>],
    nodes: &[LayoutNode],
) -> Vec<usize> {
    let mut best: Option<(usize, u64, Vec<usize>)> = None;
    for &start in unassigned {
        let mut parent: Vec<(usize, usize)> = Vec::new();
        let mut stack = vec![(start, usize::MAX, 1usize, nodes[start].priority)];
        let mut visited = BTreeSet::new();
        let mut tail = (1usize, nodes[start].priority, start);
        while let Some((node, prev, depth, sum)) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            if prev != usize::MAX {
                parent.push((node, prev));
            }
            if (depth, sum) > (tail.0, tail.1) {
                tail = (depth, sum, node);
            }
            for &next in &adjacency[node] {
                if next != prev && unassigned.contains(&next) && !visited.contains(&next) {
                    stack.push((next, node, depth + 1, sum.wrapping_add(nodes[next].priority)));
                }
            }
        }
        let mut path = vec![tail.2];
        let mut cursor = tail.2;
        while cursor != start {
            match parent.iter().find(|&&(n, _)| n == cursor) {
                Some(&(_, p)) => {
                    path.push(p);
                    cursor = p;
                }
                None => break,
            }
        }
        let candidate = (tail.0, tail.1, path);
        let better = match &best {
            None => true,
            Some((len, sum, _)) => (candidate.0, candidate.1) > (*len, *sum),
        };
        if better {
            best = Some(candidate);
        }
    }
    best.map(|(_, _, path)| path).unwrap_or_default()
}
