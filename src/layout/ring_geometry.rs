use std::f64::consts::{FRAC_PI_2, PI};

use petgraph::graph::NodeIndex;

use crate::layout::geometry::Vec2;
use crate::layout::relax::relax_system;
use crate::layout::rings::RingSystem;
use crate::layout::LayoutParams;

/// Circumradius of a regular `n`-gon with side length `side`.
pub(crate) fn circumradius(n: usize, side: f64) -> f64 {
    side / (2.0 * (PI / n as f64).sin())
}

/// Inverse-square-distance sum from `p` to every point in `points`.
///
/// Lower is emptier. Used to choose among otherwise-equivalent geometric
/// options: arc sides, anchor directions, free-sweep gaps.
pub(crate) fn congestion(p: Vec2, points: &[Vec2]) -> f64 {
    points
        .iter()
        .map(|&q| 1.0 / p.distance(q).powi(2).max(1e-12))
        .sum()
}

/// Local coordinate frame for one ring system, computed once during tree
/// construction and stamped into the global frame (rotated, possibly
/// reflected) during placement.
///
/// Rings are laid down in descending priority order. The first ring is a
/// regular polygon; every later ring is fitted as a circular arc over the
/// chord between the two terminal atoms of its longest already-placed run,
/// on whichever side is less congested. Systems with more than one ring are
/// then relaxed.
#[derive(Debug, Clone)]
pub(crate) struct RingGeometry {
    system: RingSystem,
    atoms: Vec<NodeIndex>,
    coords: Vec<Vec2>,
    bond_pairs: Vec<(usize, usize)>,
    bond_length: f64,
}

impl RingGeometry {
    pub fn build(system: RingSystem, params: &LayoutParams) -> Self {
        let atoms = system.atoms.clone();
        let n = atoms.len();
        let local = |a: NodeIndex| atoms.binary_search(&a).ok();
        let cycles: Vec<Vec<usize>> = system
            .rings
            .iter()
            .map(|r| r.atoms().iter().filter_map(|&a| local(a)).collect())
            .collect();

        let mut bond_pairs = std::collections::BTreeSet::new();
        for cycle in &cycles {
            let len = cycle.len();
            for i in 0..len {
                let (a, b) = (cycle[i], cycle[(i + 1) % len]);
                bond_pairs.insert((a.min(b), a.max(b)));
            }
        }
        let bond_pairs: Vec<(usize, usize)> = bond_pairs.into_iter().collect();

        let mut coords = vec![Vec2::ZERO; n];
        let mut placed = vec![false; n];
        let mut done = vec![false; cycles.len()];
        for _ in 0..cycles.len() {
            let pick = pick_next(&cycles, &done, &placed);
            done[pick] = true;
            place_ring(&cycles[pick], &mut coords, &mut placed, params.bond_length);
        }

        if cycles.len() > 1 {
            relax_system(
                &mut coords,
                &bond_pairs,
                &cycles,
                params.bond_length,
                params.relax_tolerance,
                params.relax_max_iter,
            );
        }

        Self {
            system,
            atoms,
            coords,
            bond_pairs,
            bond_length: params.bond_length,
        }
    }

    pub fn system(&self) -> &RingSystem {
        &self.system
    }

    pub fn atoms(&self) -> &[NodeIndex] {
        &self.atoms
    }

    pub fn coords(&self) -> &[Vec2] {
        &self.coords
    }

    pub fn bond_pairs(&self) -> &[(usize, usize)] {
        &self.bond_pairs
    }

    pub fn local(&self, atom: NodeIndex) -> Option<usize> {
        self.atoms.binary_search(&atom).ok()
    }

    pub fn centroid(&self) -> Vec2 {
        let n = self.coords.len().max(1) as f64;
        let sum = self
            .coords
            .iter()
            .fold(Vec2::ZERO, |acc, &p| acc + p);
        sum * (1.0 / n)
    }

    /// The angular gap at `atom` left open by the system's own bonds, as
    /// `(start, width)` in the local frame.
    ///
    /// Among the gaps between sorted internal-bond angles, the one whose
    /// midpoint probe is least congested per radian of width wins.
    pub fn free_sweep(&self, atom: NodeIndex) -> (f64, f64) {
        let li = match self.local(atom) {
            Some(i) => i,
            None => return (0.0, 2.0 * PI),
        };
        let p = self.coords[li];
        let mut angles: Vec<f64> = self
            .system
            .internal_neighbors(atom)
            .into_iter()
            .filter_map(|a| self.local(a))
            .map(|i| (self.coords[i] - p).angle())
            .collect();
        angles.sort_by(f64::total_cmp);

        match angles.len() {
            0 => (0.0, 2.0 * PI),
            1 => (angles[0], 2.0 * PI),
            _ => {
                let others: Vec<Vec2> = self
                    .coords
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != li)
                    .map(|(_, &q)| q)
                    .collect();
                let mut best = (f64::INFINITY, angles[0], 0.0);
                for i in 0..angles.len() {
                    let start = angles[i];
                    let end = if i + 1 == angles.len() {
                        angles[0] + 2.0 * PI
                    } else {
                        angles[i + 1]
                    };
                    let width = end - start;
                    if width < 1e-6 {
                        continue;
                    }
                    let probe = p + Vec2::from_angle(start + width / 2.0) * self.bond_length;
                    let score = congestion(probe, &others) / width;
                    if score < best.0 {
                        best = (score, start, width);
                    }
                }
                (best.1, best.2)
            }
        }
    }

    /// How much angle the system occupies around `atom`: the complement of
    /// the free sweep there.
    pub fn angular_demand(&self, atom: NodeIndex) -> f64 {
        2.0 * PI - self.free_sweep(atom).1
    }
}

/// Highest-priority undone ring that touches an already-placed atom, or the
/// highest-priority undone ring outright when nothing is placed yet.
/// Priority order is the ring order inside the system.
fn pick_next(cycles: &[Vec<usize>], done: &[bool], placed: &[bool]) -> usize {
    for (i, cycle) in cycles.iter().enumerate() {
        if !done[i] && cycle.iter().any(|&a| placed[a]) {
            return i;
        }
    }
    cycles
        .iter()
        .enumerate()
        .position(|(i, _)| !done[i])
        .unwrap_or(0)
}

fn place_ring(cycle: &[usize], coords: &mut [Vec2], placed: &mut [bool], bond_length: f64) {
    let k = cycle.len();
    if k < 3 {
        return;
    }
    let flags: Vec<bool> = cycle.iter().map(|&a| placed[a]).collect();
    let placed_count = flags.iter().filter(|&&f| f).count();

    if placed_count == k {
        return;
    }
    if placed_count == 0 {
        let r = circumradius(k, bond_length);
        for (i, &a) in cycle.iter().enumerate() {
            let theta = FRAC_PI_2 - i as f64 * 2.0 * PI / k as f64;
            coords[a] = Vec2::from_angle(theta) * r;
            placed[a] = true;
        }
        return;
    }

    let (start, run_len) = longest_run(&flags);
    if run_len == 1 {
        place_anchored(cycle, start, coords, placed, bond_length);
        return;
    }

    // Head chain a..b is placed; the new atoms continue past b and wrap
    // around to just before a.
    let head_a = cycle[start];
    let head_b = cycle[(start + run_len - 1) % k];
    let pa = coords[head_a];
    let pb = coords[head_b];
    let chord = pa.distance(pb);
    if chord < 1e-9 {
        place_anchored(cycle, start, coords, placed, bond_length);
        return;
    }

    let new_count = k - run_len;
    // Arc angle the new segment would subtend if the ring were regular.
    let phi = (new_count + 1) as f64 * 2.0 * PI / k as f64;
    let half = phi / 2.0;
    let radius = (chord / 2.0) / half.sin();
    let offset = (chord / 2.0) * (half.cos() / half.sin());

    let mid = (pa + pb) * 0.5;
    let dir = (pa - pb) * (1.0 / chord);
    let perp = dir.rotated(FRAC_PI_2);
    let occupied: Vec<Vec2> = placed
        .iter()
        .enumerate()
        .filter(|&(_, &f)| f)
        .map(|(i, _)| coords[i])
        .collect();

    let mut best: Option<(f64, Vec2, f64, f64)> = None;
    for side in [1.0, -1.0] {
        let center = mid + perp * (offset * side);
        let theta_b = (pb - center).angle();
        let theta_a = (pa - center).angle();
        let mut sweep = crate::layout::geometry::normalize_angle(theta_a - theta_b);
        let alt = if sweep > 0.0 {
            sweep - 2.0 * PI
        } else {
            sweep + 2.0 * PI
        };
        if (alt.abs() - phi).abs() < (sweep.abs() - phi).abs() {
            sweep = alt;
        }
        let probe = center + Vec2::from_angle(theta_b + sweep / 2.0) * radius;
        let score = congestion(probe, &occupied);
        if best.map_or(true, |(s, _, _, _)| score < s) {
            best = Some((score, center, theta_b, sweep));
        }
    }
    let (_, center, theta_b, sweep) = match best {
        Some(b) => b,
        None => return,
    };

    for t in 1..=new_count {
        let a = cycle[(start + run_len - 1 + t) % k];
        if placed[a] {
            continue;
        }
        let theta = theta_b + sweep * t as f64 / (new_count + 1) as f64;
        coords[a] = center + Vec2::from_angle(theta) * radius;
        placed[a] = true;
    }
}

/// Fallback for rings touching the placed body at a single atom: hang a
/// fresh polygon off that anchor, centered in the least congested direction.
fn place_anchored(
    cycle: &[usize],
    anchor_pos: usize,
    coords: &mut [Vec2],
    placed: &mut [bool],
    bond_length: f64,
) {
    let k = cycle.len();
    let anchor = cycle[anchor_pos];
    let p = coords[anchor];
    let r = circumradius(k, bond_length);
    let occupied: Vec<Vec2> = placed
        .iter()
        .enumerate()
        .filter(|&(_, &f)| f)
        .map(|(i, _)| coords[i])
        .collect();

    let mut center = p + Vec2::new(r, 0.0);
    let mut best = f64::INFINITY;
    for i in 0..12 {
        let candidate = p + Vec2::from_angle(i as f64 * PI / 6.0) * r;
        let score = congestion(candidate, &occupied);
        if score < best {
            best = score;
            center = candidate;
        }
    }

    let theta0 = (p - center).angle();
    for t in 1..k {
        let a = cycle[(anchor_pos + t) % k];
        if placed[a] {
            continue;
        }
        let theta = theta0 + t as f64 * 2.0 * PI / k as f64;
        coords[a] = center + Vec2::from_angle(theta) * r;
        placed[a] = true;
    }
}

/// Longest cyclic run of `true` flags, as `(start, length)`. Ties go to the
/// lowest start index. At least one flag must be set and at least one clear.
fn longest_run(flags: &[bool]) -> (usize, usize) {
    let k = flags.len();
    let mut best = (0, 0);
    for i in 0..k {
        if !flags[i] || flags[(i + k - 1) % k] {
            continue;
        }
        let mut len = 1;
        while len < k && flags[(i + len) % k] {
            len += 1;
        }
        if len > best.1 {
            best = (i, len);
        }
    }
    best
}
