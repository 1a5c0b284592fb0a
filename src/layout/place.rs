use std::collections::HashSet;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_6, PI};

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::layout::geometry::{
    normalize_angle, point_segment_distance, segments_cross, signed_area, Vec2,
};
use crate::layout::ring_geometry::RingGeometry;
use crate::layout::tree::{EdgeId, EdgeKind, LayoutTree, NodeId, NodeKind};
use crate::layout::LayoutParams;

/// Append-only placement record with snapshot/restore rollback.
///
/// Placement only ever appends, so saving the two list lengths and
/// truncating back is a complete transaction rollback. The first placement
/// of an atom wins; later placements of the same atom (the shared atom of a
/// spiro stamp) are ignored.
pub(crate) struct PlacedState {
    coords: Vec<Option<Vec2>>,
    atoms: Vec<NodeIndex>,
    bonds: Vec<(NodeIndex, NodeIndex)>,
}

impl PlacedState {
    pub fn new() -> Self {
        Self {
            coords: Vec::new(),
            atoms: Vec::new(),
            bonds: Vec::new(),
        }
    }

    pub fn clear(&mut self, atom_count: usize) {
        self.coords.clear();
        self.coords.resize(atom_count, None);
        self.atoms.clear();
        self.bonds.clear();
    }

    pub fn position(&self, atom: NodeIndex) -> Option<Vec2> {
        self.coords.get(atom.index()).copied().flatten()
    }

    fn snapshot(&self) -> (usize, usize) {
        (self.atoms.len(), self.bonds.len())
    }

    fn restore(&mut self, snap: (usize, usize)) {
        for &a in &self.atoms[snap.0..] {
            self.coords[a.index()] = None;
        }
        self.atoms.truncate(snap.0);
        self.bonds.truncate(snap.1);
    }

    fn place_atom(&mut self, atom: NodeIndex, pos: Vec2) {
        if self.coords[atom.index()].is_none() {
            self.coords[atom.index()] = Some(pos);
            self.atoms.push(atom);
        }
    }

    fn place_bond(&mut self, a: NodeIndex, b: NodeIndex) {
        self.bonds.push((a, b));
    }

    /// Collisions introduced since `snap`: new atoms against prior atoms and
    /// bonds, new bonds against prior bonds and atoms. Items sharing an atom
    /// index never collide with each other.
    fn new_collisions(&self, snap: (usize, usize), radius: f64) -> u32 {
        let mut count = 0;
        for &a in &self.atoms[snap.0..] {
            let pa = match self.position(a) {
                Some(p) => p,
                None => continue,
            };
            for &b in &self.atoms[..snap.0] {
                if let Some(pb) = self.position(b) {
                    if pa.distance(pb) < radius {
                        count += 1;
                    }
                }
            }
            for &(u, v) in &self.bonds[..snap.1] {
                if u == a || v == a {
                    continue;
                }
                if let (Some(pu), Some(pv)) = (self.position(u), self.position(v)) {
                    if point_segment_distance(pa, pu, pv) < radius {
                        count += 1;
                    }
                }
            }
        }
        for &(u, v) in &self.bonds[snap.1..] {
            let (pu, pv) = match (self.position(u), self.position(v)) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            for &(x, y) in &self.bonds[..snap.1] {
                if x == u || x == v || y == u || y == v {
                    continue;
                }
                if let (Some(px), Some(py)) = (self.position(x), self.position(y)) {
                    if segments_cross(pu, pv, px, py) {
                        count += 1;
                    }
                }
            }
            for &a in &self.atoms[..snap.0] {
                if a == u || a == v {
                    continue;
                }
                if let Some(pa) = self.position(a) {
                    if point_segment_distance(pa, pu, pv) < radius {
                        count += 1;
                    }
                }
            }
        }
        count
    }
}

/// Incoming anchor handed from a parent to one child: where the child's
/// attachment atom must go, the direction it arrived from, and the zig-zag
/// parity for chain continuation.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    edge: EdgeId,
    pos: Vec2,
    dir: f64,
    flip: bool,
}

/// The rigid transform a stamped ring system ended up with, kept so that
/// local free-sweep angles can be mapped into the world frame when the
/// system's children are placed.
#[derive(Debug, Clone, Copy)]
struct RingPose {
    omega: f64,
    theta: f64,
    reflect: bool,
    local_anchor: Vec2,
    world_anchor: Vec2,
}

impl RingPose {
    fn map_point(&self, local: Vec2) -> Vec2 {
        let mut q = (local - self.local_anchor).rotated(-self.omega);
        if self.reflect {
            q.y = -q.y;
        }
        self.world_anchor + q.rotated(self.theta)
    }

    fn map_angle(&self, alpha: f64) -> f64 {
        if self.reflect {
            normalize_angle(self.theta - (alpha - self.omega))
        } else {
            normalize_angle(alpha - self.omega + self.theta)
        }
    }

    fn map_interval(&self, start: f64, width: f64) -> (f64, f64) {
        if self.reflect {
            (self.map_angle(start + width), width)
        } else {
            (self.map_angle(start), width)
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum OwnCandidate {
    Atom,
    Ring { extra: f64, reflect: bool },
}

struct StereoCheck {
    ends: [NodeIndex; 2],
    refs: [NodeIndex; 2],
    cis: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Done,
    Failed,
    /// The failure budget ran out; unwind to the escalation ladder.
    Exhausted,
}

enum Attempt {
    Done,
    Collision,
    Stereo,
    Failed,
    Exhausted,
}

struct Search<'a> {
    tree: &'a LayoutTree,
    params: &'a LayoutParams,
    constraints: &'a [StereoCheck],
    poses: Vec<Option<RingPose>>,
    strict: bool,
    tolerance: u32,
    budget: i64,
}

/// Places one component's tree into `state`, escalating search parameters
/// until it succeeds: strict canonical angles first, then the full variant
/// tables, then a collision tolerance of 1 doubled without bound. A large
/// enough tolerance accepts the first candidate everywhere, so this always
/// terminates.
pub(crate) fn run_search(tree: &LayoutTree, state: &mut PlacedState, params: &LayoutParams) {
    if tree.is_empty() {
        return;
    }
    let constraints: Vec<StereoCheck> = tree
        .edges()
        .iter()
        .filter_map(|e| {
            e.stereo.map(|c| StereoCheck {
                ends: e.atoms,
                refs: c.refs,
                cis: c.cis,
            })
        })
        .collect();

    let mut strict = true;
    let mut tolerance = 0u32;
    loop {
        let snap = state.snapshot();
        let mut search = Search {
            tree,
            params,
            constraints: &constraints,
            poses: vec![None; tree.node_count()],
            strict,
            tolerance,
            budget: params.fail_budget as i64,
        };
        if search.place_root(state) == Outcome::Done {
            return;
        }
        state.restore(snap);
        if strict {
            strict = false;
            debug!("placement failed in strict mode, widening variant tables");
        } else if tolerance == 0 {
            tolerance = 1;
            debug!(tolerance, "raising collision tolerance");
        } else {
            tolerance = tolerance.saturating_mul(2);
            debug!(tolerance, "raising collision tolerance");
        }
    }
}

impl<'a> Search<'a> {
    fn place_root(&mut self, state: &mut PlacedState) -> Outcome {
        let tree = self.tree;
        let root = tree.root();
        let snap = state.snapshot();
        match &tree.node(root).kind {
            NodeKind::Atom(a) => state.place_atom(*a, Vec2::ZERO),
            NodeKind::RingSystem(g) => {
                let pose = RingPose {
                    omega: 0.0,
                    theta: 0.0,
                    reflect: false,
                    local_anchor: Vec2::ZERO,
                    world_anchor: Vec2::ZERO,
                };
                stamp_ring(g, &pose, state);
                self.poses[root.0] = Some(pose);
            }
        }
        let out = self.place_children(root, None, state);
        if out != Outcome::Done {
            state.restore(snap);
        }
        out
    }

    /// Enumerates this node's own spatial candidates at `anchor`, trying
    /// each and recursing. In the tolerance tiers, candidates rejected only
    /// by a stereo constraint are retried with the constraint waived once
    /// everything else failed.
    fn place_subtree(&mut self, node: NodeId, anchor: Anchor, state: &mut PlacedState) -> Outcome {
        let candidates = self.own_candidates(node);
        let mut stereo_only = Vec::new();
        for (i, candidate) in candidates.iter().enumerate() {
            match self.attempt(node, anchor, *candidate, state, false) {
                Attempt::Done => return Outcome::Done,
                Attempt::Exhausted => return Outcome::Exhausted,
                Attempt::Stereo => stereo_only.push(i),
                Attempt::Collision | Attempt::Failed => {}
            }
        }
        // Stereo waivers only exist in the tolerance tiers; before that,
        // ancestors still have variants of their own to try.
        if self.tolerance > 0 {
            for &i in &stereo_only {
                match self.attempt(node, anchor, candidates[i], state, true) {
                    Attempt::Done => return Outcome::Done,
                    Attempt::Exhausted => return Outcome::Exhausted,
                    _ => {}
                }
            }
        }
        self.budget -= 1;
        if self.budget <= 0 {
            Outcome::Exhausted
        } else {
            Outcome::Failed
        }
    }

    fn own_candidates(&self, node: NodeId) -> Vec<OwnCandidate> {
        match &self.tree.node(node).kind {
            NodeKind::Atom(_) => vec![OwnCandidate::Atom],
            NodeKind::RingSystem(_) => {
                let mut out = vec![
                    OwnCandidate::Ring { extra: 0.0, reflect: false },
                    OwnCandidate::Ring { extra: 0.0, reflect: true },
                ];
                if !self.strict {
                    for extra in [FRAC_PI_6, -FRAC_PI_6, FRAC_PI_3, -FRAC_PI_3] {
                        for reflect in [false, true] {
                            out.push(OwnCandidate::Ring { extra, reflect });
                        }
                    }
                }
                out
            }
        }
    }

    fn attempt(
        &mut self,
        node: NodeId,
        anchor: Anchor,
        candidate: OwnCandidate,
        state: &mut PlacedState,
        waive_stereo: bool,
    ) -> Attempt {
        let tree = self.tree;
        let snap = state.snapshot();
        let (own_attach, far_attach) = tree.attach(anchor.edge, node);
        let edge_kind = tree.edge(anchor.edge).kind;

        match (&tree.node(node).kind, candidate) {
            (NodeKind::Atom(a), OwnCandidate::Atom) => {
                state.place_atom(*a, anchor.pos);
                state.place_bond(far_attach, *a);
            }
            (NodeKind::RingSystem(g), OwnCandidate::Ring { extra, reflect }) => {
                let pose = ring_pose(g, own_attach, anchor, extra, reflect);
                stamp_ring(g, &pose, state);
                self.poses[node.0] = Some(pose);
                if let EdgeKind::Bond(_) = edge_kind {
                    state.place_bond(far_attach, own_attach);
                }
            }
            _ => return Attempt::Failed,
        }

        let collisions = state.new_collisions(snap, self.params.collision_radius);
        if collisions > self.tolerance {
            state.restore(snap);
            return Attempt::Collision;
        }
        if !waive_stereo && self.stereo_violated(state) {
            state.restore(snap);
            return Attempt::Stereo;
        }

        match self.place_children(node, Some((anchor.dir, anchor.flip)), state) {
            Outcome::Done => Attempt::Done,
            Outcome::Failed => {
                state.restore(snap);
                Attempt::Failed
            }
            Outcome::Exhausted => {
                state.restore(snap);
                Attempt::Exhausted
            }
        }
    }

    /// True when any fully-placed cis/trans constraint is unsatisfied. A
    /// degenerate (collinear) reference counts as unsatisfied: the drawing
    /// has to bend to show the configuration.
    fn stereo_violated(&self, state: &PlacedState) -> bool {
        for check in self.constraints {
            let positions = [
                state.position(check.ends[0]),
                state.position(check.ends[1]),
                state.position(check.refs[0]),
                state.position(check.refs[1]),
            ];
            let [pa, pb, pr0, pr1] = match positions {
                [Some(a), Some(b), Some(c), Some(d)] => [a, b, c, d],
                _ => continue,
            };
            let s0 = signed_area(pa, pb, pr0);
            let s1 = signed_area(pa, pb, pr1);
            let product = s0 * s1;
            let same_side = product > 1e-9;
            let opposite = product < -1e-9;
            if (check.cis && !same_side) || (!check.cis && !opposite) {
                return true;
            }
        }
        false
    }

    fn place_children(
        &mut self,
        node: NodeId,
        incoming: Option<(f64, bool)>,
        state: &mut PlacedState,
    ) -> Outcome {
        let children = self.tree.children_of(node);
        if children.is_empty() {
            return Outcome::Done;
        }
        let variants = match &self.tree.node(node).kind {
            NodeKind::Atom(a) => self.atom_child_variants(*a, incoming, &children, state),
            NodeKind::RingSystem(g) => self.ring_child_variants(node, g, &children, state),
        };
        if variants.is_empty() {
            return Outcome::Failed;
        }

        for variant in &variants {
            let snap = state.snapshot();
            let mut ok = true;
            let mut exhausted = false;
            for (anchor, &(_, child)) in variant.iter().zip(&children) {
                match self.place_subtree(child, *anchor, state) {
                    Outcome::Done => {}
                    Outcome::Failed => {
                        ok = false;
                        break;
                    }
                    Outcome::Exhausted => {
                        ok = false;
                        exhausted = true;
                        break;
                    }
                }
            }
            if ok {
                return Outcome::Done;
            }
            state.restore(snap);
            if exhausted {
                return Outcome::Exhausted;
            }
        }
        Outcome::Failed
    }

    /// Candidate angle assignments for an atom node's children.
    ///
    /// Strict mode offers the canonical fan and its mirror image; free mode
    /// adds rotated fans and bond-length variants up to the configured cap.
    fn atom_child_variants(
        &self,
        atom: NodeIndex,
        incoming: Option<(f64, bool)>,
        children: &[(EdgeId, NodeId)],
        state: &PlacedState,
    ) -> Vec<Vec<Anchor>> {
        let pos = match state.position(atom) {
            Some(p) => p,
            None => return Vec::new(),
        };
        let k = children.len();
        let bond = self.params.bond_length;

        let (base, incoming_dir): (Vec<f64>, Option<f64>) = match incoming {
            // Root fan. Two children get 120 degrees, not a straight line,
            // so the chain can zig-zag through the root.
            None => {
                let slots = match k {
                    2 => vec![-FRAC_PI_6, -FRAC_PI_6 - 2.0 * FRAC_PI_3],
                    _ => (0..k)
                        .map(|i| -FRAC_PI_6 + i as f64 * 2.0 * PI / k as f64)
                        .collect(),
                };
                (slots, None)
            }
            Some((dir, flip)) => {
                let dev = if flip { FRAC_PI_3 } else { -FRAC_PI_3 };
                let offsets: Vec<f64> = match k {
                    1 => vec![dev],
                    2 => vec![dev, -dev],
                    3 => vec![0.0, FRAC_PI_2, -FRAC_PI_2],
                    _ => (0..k)
                        .map(|i| PI + (i + 1) as f64 * 2.0 * PI / (k + 1) as f64)
                        .collect(),
                };
                (offsets.iter().map(|o| dir + o).collect(), Some(dir))
            }
        };
        let mirror: Vec<f64> = match incoming_dir {
            None => base.iter().map(|&a| -a).collect(),
            Some(dir) => base.iter().map(|&a| 2.0 * dir - a).collect(),
        };

        let mut tables: Vec<(Vec<f64>, f64)> = vec![(base.clone(), 1.0), (mirror.clone(), 1.0)];
        if !self.strict {
            for perm in slot_permutations(children, |&(e, c)| self.child_demand(e, c)) {
                tables.push((perm.iter().map(|&s| base[s]).collect(), 1.0));
                tables.push((perm.iter().map(|&s| mirror[s]).collect(), 1.0));
            }
            for rot in [FRAC_PI_6, -FRAC_PI_6, FRAC_PI_3, -FRAC_PI_3] {
                tables.push((base.iter().map(|&a| a + rot).collect(), 1.0));
                tables.push((mirror.iter().map(|&a| a + rot).collect(), 1.0));
            }
            for len in [1.25, 0.8, 1.5] {
                tables.push((base.clone(), len));
                tables.push((mirror.clone(), len));
            }
            tables.truncate(self.params.max_variants);
        }

        tables
            .into_iter()
            .map(|(slots, len)| {
                slots
                    .iter()
                    .zip(children)
                    .enumerate()
                    .map(|(i, (&slot, &(eid, _)))| {
                        let flip = match incoming_dir {
                            Some(dir) => normalize_angle(slot - dir) <= 0.0,
                            None => i % 2 == 0,
                        };
                        Anchor {
                            edge: eid,
                            pos: pos + Vec2::from_angle(slot) * (bond * len),
                            dir: slot,
                            flip,
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Candidate slot assignments for a ring system's children, one group
    /// per attachment atom. Within a group, children split the attachment
    /// atom's free sweep in proportion to their angular demand; variants
    /// are combined across groups mixed-radix up to the cap.
    fn ring_child_variants(
        &self,
        node: NodeId,
        geometry: &RingGeometry,
        children: &[(EdgeId, NodeId)],
        state: &PlacedState,
    ) -> Vec<Vec<Anchor>> {
        let pose = match self.poses[node.0] {
            Some(p) => p,
            None => return Vec::new(),
        };
        let bond = self.params.bond_length;

        // Group child indices by attachment atom, preserving child order.
        let mut groups: Vec<(NodeIndex, Vec<usize>)> = Vec::new();
        for (i, &(eid, _)) in children.iter().enumerate() {
            let (attach, _) = self.tree.attach(eid, node);
            match groups.iter_mut().find(|(a, _)| *a == attach) {
                Some((_, members)) => members.push(i),
                None => groups.push((attach, vec![i])),
            }
        }

        // Candidate anchor lists per group.
        let mut per_group: Vec<Vec<Vec<Anchor>>> = Vec::with_capacity(groups.len());
        for (attach, members) in &groups {
            let apos = match state.position(*attach) {
                Some(p) => p,
                None => return Vec::new(),
            };
            let (local_start, width) = geometry.free_sweep(*attach);
            let (start, width) = pose.map_interval(local_start, width);
            let m = members.len();

            let demands: Vec<f64> = members
                .iter()
                .map(|&i| self.child_demand(children[i].0, children[i].1).max(0.1))
                .collect();
            let total: f64 = demands.iter().sum();

            let mut acc = 0.0;
            let weighted: Vec<f64> = demands
                .iter()
                .map(|w| {
                    let c = start + width * (acc + w / 2.0) / total;
                    acc += w;
                    c
                })
                .collect();
            let weighted_mirror: Vec<f64> =
                weighted.iter().map(|&c| 2.0 * start + width - c).collect();

            let mut slot_sets = vec![weighted.clone(), weighted_mirror];
            if !self.strict {
                let uniform: Vec<f64> = (0..m)
                    .map(|i| start + width * (i + 1) as f64 / (m + 1) as f64)
                    .collect();
                let uniform_mirror: Vec<f64> =
                    uniform.iter().map(|&c| 2.0 * start + width - c).collect();
                slot_sets.push(uniform);
                slot_sets.push(uniform_mirror);
            }

            let anchors: Vec<Vec<Anchor>> = slot_sets
                .into_iter()
                .map(|slots| {
                    slots
                        .iter()
                        .zip(members)
                        .map(|(&slot, &i)| {
                            let (eid, _) = children[i];
                            let pos = match self.tree.edge(eid).kind {
                                EdgeKind::Bond(_) => apos + Vec2::from_angle(slot) * bond,
                                EdgeKind::Spiro => apos,
                            };
                            Anchor { edge: eid, pos, dir: slot, flip: true }
                        })
                        .collect()
                })
                .collect();
            per_group.push(anchors);
        }

        // Mixed-radix combination of per-group choices.
        let cap = if self.strict { 2 } else { self.params.max_variants };
        let total: usize = per_group.iter().map(|g| g.len()).product();
        let mut variants = Vec::new();
        for v in 0..total.min(cap) {
            let mut slots: Vec<Option<Anchor>> = vec![None; children.len()];
            let mut rest = v;
            for ((_, members), group) in groups.iter().zip(&per_group) {
                let choice = rest % group.len();
                rest /= group.len();
                for (anchor, &i) in group[choice].iter().zip(members) {
                    slots[i] = Some(*anchor);
                }
            }
            if slots.iter().all(Option::is_some) {
                variants.push(slots.into_iter().flatten().collect());
            }
        }
        variants
    }

    /// Angular sweep a child subtree needs at its attachment point.
    fn child_demand(&self, edge: EdgeId, child: NodeId) -> f64 {
        match &self.tree.node(child).kind {
            NodeKind::Atom(_) => {
                let fan_out = self.tree.node(child).edges.len().saturating_sub(1);
                FRAC_PI_3 * (1 + fan_out) as f64
            }
            NodeKind::RingSystem(g) => {
                let (attach, _) = self.tree.attach(edge, child);
                g.angular_demand(attach)
            }
        }
    }
}

/// Non-identity child-to-slot permutations, deduplicated by symmetry: two
/// assignments that give every slot a child of the same angular demand draw
/// identically, so only one survives. Beyond four children only the
/// canonical order is tried.
fn slot_permutations<T, F: Fn(&T) -> f64>(children: &[T], demand: F) -> Vec<Vec<usize>> {
    let k = children.len();
    if !(2..=4).contains(&k) {
        return Vec::new();
    }
    let demands: Vec<u64> = children.iter().map(|c| demand(c).to_bits()).collect();
    let mut seen: HashSet<Vec<u64>> = HashSet::new();
    seen.insert(demands.clone());
    let mut perms = Vec::new();
    let mut perm: Vec<usize> = (0..k).collect();
    let mut counters = vec![0usize; k];
    let mut i = 0;
    while i < k {
        if counters[i] < i {
            if i % 2 == 0 {
                perm.swap(0, i);
            } else {
                perm.swap(counters[i], i);
            }
            counters[i] += 1;
            i = 0;
            let mut sig = vec![0u64; k];
            for (j, &s) in perm.iter().enumerate() {
                sig[s] = demands[j];
            }
            if seen.insert(sig) {
                perms.push(perm.clone());
            }
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
    perms
}

fn ring_pose(
    geometry: &RingGeometry,
    attach: NodeIndex,
    anchor: Anchor,
    extra: f64,
    reflect: bool,
) -> RingPose {
    let local_anchor = geometry
        .local(attach)
        .map(|i| geometry.coords()[i])
        .unwrap_or(Vec2::ZERO);
    let toward_body = geometry.centroid() - local_anchor;
    let omega = if toward_body.length() < 1e-9 {
        0.0
    } else {
        toward_body.angle()
    };
    RingPose {
        omega,
        theta: anchor.dir + extra,
        reflect,
        local_anchor,
        world_anchor: anchor.pos,
    }
}

fn stamp_ring(geometry: &RingGeometry, pose: &RingPose, state: &mut PlacedState) {
    for (&atom, &local) in geometry.atoms().iter().zip(geometry.coords()) {
        state.place_atom(atom, pose.map_point(local));
    }
    for &(a, b) in geometry.bond_pairs() {
        state.place_bond(geometry.atoms()[a], geometry.atoms()[b]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::priority::atom_priorities;
    use crate::layout::rings::{build_rings, merge_ring_systems};
    use crate::layout::tree::build_tree;
    use crate::rings::Sssr;
    use crate::smiles::from_smiles;

    fn layout(smiles: &str) -> (crate::Mol<crate::Atom, crate::Bond>, PlacedState) {
        let mol = from_smiles(smiles).unwrap();
        let sssr = Sssr::perceive(&mol);
        let priorities = atom_priorities(&mol, &sssr);
        let rings = build_rings(&mol, &sssr, &priorities);
        let (systems, spiro) = merge_ring_systems(rings);
        let component: Vec<NodeIndex> = mol.atoms().collect();
        let params = LayoutParams::default();
        let tree = build_tree(&mol, &component, systems, &spiro, &priorities, &params);
        let mut state = PlacedState::new();
        state.clear(mol.atom_count());
        run_search(&tree, &mut state, &params);
        (mol, state)
    }

    fn positions(mol: &crate::Mol<crate::Atom, crate::Bond>, state: &PlacedState) -> Vec<Vec2> {
        mol.atoms()
            .map(|a| state.position(a).expect("every atom placed"))
            .collect()
    }

    #[test]
    fn every_atom_gets_a_position() {
        let (mol, state) = layout("CC(C)Cc1ccccc1OC");
        for a in mol.atoms() {
            assert!(state.position(a).is_some(), "atom {} unplaced", a.index());
        }
    }

    #[test]
    fn chain_bonds_are_nominal() {
        let (mol, state) = layout("CCCCC");
        let p = positions(&mol, &state);
        let l = LayoutParams::default().bond_length;
        for e in mol.bonds() {
            let (u, v) = mol.bond_endpoints(e).unwrap();
            let d = p[u.index()].distance(p[v.index()]);
            assert!((d - l).abs() < 1e-6, "bond {} length {}", e.index(), d);
        }
    }

    #[test]
    fn chain_zig_zags() {
        let (mol, state) = layout("CCCCC");
        let p = positions(&mol, &state);
        let l = LayoutParams::default().bond_length;
        for e in mol.bonds() {
            let (u, v) = mol.bond_endpoints(e).unwrap();
            let dy = (p[u.index()].y - p[v.index()].y).abs();
            assert!((dy - l / 2.0).abs() < 1e-6, "bond rise {} not 30 degrees", dy);
        }
    }

    #[test]
    fn trans_constraint_satisfied() {
        let (mol, state) = layout("C/C=C/C");
        let p = positions(&mol, &state);
        let s0 = signed_area(p[1], p[2], p[0]);
        let s1 = signed_area(p[1], p[2], p[3]);
        assert!(s0 * s1 < 0.0, "references on the same side of a trans bond");
    }

    #[test]
    fn cis_constraint_satisfied() {
        let (mol, state) = layout(r"C/C=C\C");
        let p = positions(&mol, &state);
        let s0 = signed_area(p[1], p[2], p[0]);
        let s1 = signed_area(p[1], p[2], p[3]);
        assert!(s0 * s1 > 0.0, "references on opposite sides of a cis bond");
    }

    #[test]
    fn benzene_is_rigid_hexagon() {
        let (mol, state) = layout("c1ccccc1");
        let p = positions(&mol, &state);
        let l = LayoutParams::default().bond_length;
        for e in mol.bonds() {
            let (u, v) = mol.bond_endpoints(e).unwrap();
            assert!((p[u.index()].distance(p[v.index()]) - l).abs() < 1e-6);
        }
    }

    #[test]
    fn toluene_methyl_outside_ring() {
        let (mol, state) = layout("Cc1ccccc1");
        let p = positions(&mol, &state);
        let center = p[1..]
            .iter()
            .fold(Vec2::ZERO, |acc, &q| acc + q)
            * (1.0 / 6.0);
        let ring_r = p[1].distance(center);
        assert!(p[0].distance(center) > ring_r + 0.5, "methyl inside the ring");
    }

    #[test]
    fn spiro_rings_share_exactly_one_atom_position() {
        let (mol, state) = layout("C1CCC2(CC1)CCC2");
        let p = positions(&mol, &state);
        let mut coincident = 0;
        for i in 0..p.len() {
            for j in (i + 1)..p.len() {
                if p[i].distance(p[j]) < 1e-6 {
                    coincident += 1;
                }
            }
        }
        assert_eq!(coincident, 0, "two distinct atoms share a position");
        // The shared spiro atom is a single graph atom, so nothing overlaps.
        assert_eq!(mol.atom_count(), 9);
    }

    #[test]
    fn no_collisions_in_modest_molecules() {
        for smiles in ["CCCCCCCC", "CC(C)CC(C)C", "c1ccccc1CCCC", "C1CCCCC1C1CCCCC1"] {
            let (mol, state) = layout(smiles);
            let p = positions(&mol, &state);
            let radius = LayoutParams::default().collision_radius;
            for i in 0..p.len() {
                for j in (i + 1)..p.len() {
                    if mol.bond_between(NodeIndex::new(i), NodeIndex::new(j)).is_some() {
                        continue;
                    }
                    assert!(
                        p[i].distance(p[j]) >= radius,
                        "{}: atoms {} and {} collide",
                        smiles,
                        i,
                        j
                    );
                }
            }
        }
    }

    #[test]
    fn slot_permutations_follow_demand_classes() {
        // Three distinct demands: all 3! orders minus the identity.
        let perms = slot_permutations(&[1.0f64, 2.0, 3.0], |&d| d);
        assert_eq!(perms.len(), 5);
        // Interchangeable children collapse to the identity.
        assert!(slot_permutations(&[1.0f64, 1.0, 1.0], |&d| d).is_empty());
        // Two equal plus one distinct: the distinct child has three slots.
        let perms = slot_permutations(&[1.0f64, 1.0, 2.0], |&d| d);
        assert_eq!(perms.len(), 2);
        assert!(slot_permutations(&[1.0f64], |&d| d).is_empty());
    }

    #[test]
    fn mixed_ring_and_chain_branches_stay_clean() {
        // A branch atom carrying a ring system and two chains of different
        // sizes; a usable drawing needs the bulky subtrees on the right slots.
        let (mol, state) = layout("CC(c1ccccc1)(CCC)CCCCC");
        let p = positions(&mol, &state);
        let radius = LayoutParams::default().collision_radius;
        for i in 0..p.len() {
            for j in (i + 1)..p.len() {
                if mol.bond_between(NodeIndex::new(i), NodeIndex::new(j)).is_some() {
                    continue;
                }
                assert!(
                    p[i].distance(p[j]) >= radius,
                    "atoms {} and {} collide",
                    i,
                    j
                );
            }
        }
    }

    #[test]
    fn determinism() {
        let (_, s1) = layout("CC(C)Cc1ccccc1");
        let (mol, s2) = layout("CC(C)Cc1ccccc1");
        for a in mol.atoms() {
            let p1 = s1.position(a).unwrap();
            let p2 = s2.position(a).unwrap();
            assert!(p1.distance(p2) < 1e-12);
        }
    }

    #[test]
    fn snapshot_restore_is_exact() {
        let mut state = PlacedState::new();
        state.clear(4);
        state.place_atom(NodeIndex::new(0), Vec2::ZERO);
        let snap = state.snapshot();
        state.place_atom(NodeIndex::new(1), Vec2::new(1.0, 0.0));
        state.place_bond(NodeIndex::new(0), NodeIndex::new(1));
        state.restore(snap);
        assert!(state.position(NodeIndex::new(0)).is_some());
        assert!(state.position(NodeIndex::new(1)).is_none());
        assert_eq!(state.snapshot(), snap);
    }

    #[test]
    fn collision_counting_sees_crossing_bonds() {
        let mut state = PlacedState::new();
        state.clear(4);
        state.place_atom(NodeIndex::new(0), Vec2::new(-1.0, 0.0));
        state.place_atom(NodeIndex::new(1), Vec2::new(1.0, 0.0));
        state.place_bond(NodeIndex::new(0), NodeIndex::new(1));
        let snap = state.snapshot();
        state.place_atom(NodeIndex::new(2), Vec2::new(0.0, -1.0));
        state.place_atom(NodeIndex::new(3), Vec2::new(0.0, 1.0));
        state.place_bond(NodeIndex::new(2), NodeIndex::new(3));
        assert!(state.new_collisions(snap, 0.5) >= 1);
    }
}
