use std::collections::VecDeque;
use std::f64::consts::PI;

use crate::layout::geometry::Vec2;
use crate::layout::ring_geometry::circumradius;

/// Local force-directed cleanup for multi-ring systems.
///
/// Builds a target-distance and spring-strength matrix, then repeatedly
/// picks the atom with the largest residual force and solves its local 2x2
/// Newton system, until the residual converges or the iteration budget runs
/// out. Targets come from three tiers: bonds at nominal length, same-ring
/// non-bonded pairs at the ideal polygon chord, and (only when the starting
/// geometry already looks bad) all remaining pairs at a topological-distance
/// target.
pub(crate) fn relax_system(
    coords: &mut [Vec2],
    bonds: &[(usize, usize)],
    rings: &[Vec<usize>],
    bond_length: f64,
    tolerance: f64,
    max_iter: usize,
) {
    let n = coords.len();
    if n < 3 {
        return;
    }

    let (target, strength) = build_matrices(coords, bonds, rings, bond_length, n);

    let gradient = |coords: &[Vec2], m: usize| -> Vec2 {
        let mut g = Vec2::ZERO;
        for j in 0..n {
            let k = strength[m * n + j];
            if j == m || k == 0.0 {
                continue;
            }
            let delta = coords[m] - coords[j];
            let d = delta.length().max(1e-9);
            g = g + delta * (k * (1.0 - target[m * n + j] / d));
        }
        g
    };

    let mut forces: Vec<Vec2> = (0..n).map(|m| gradient(coords, m)).collect();
    let initial_max = forces.iter().map(|f| f.length()).fold(0.0, f64::max);
    if initial_max < 1e-12 {
        return;
    }
    let mut prev_max = f64::INFINITY;

    for _ in 0..max_iter {
        let (m, f_max) = forces
            .iter()
            .enumerate()
            .map(|(i, f)| (i, f.length()))
            .fold((0, 0.0), |acc, cur| if cur.1 > acc.1 { cur } else { acc });
        if f_max <= tolerance * initial_max || (prev_max - f_max).abs() <= tolerance * f_max {
            break;
        }
        prev_max = f_max;

        // Hessian of the spring energy restricted to atom m.
        let mut dxx = 0.0;
        let mut dxy = 0.0;
        let mut dyy = 0.0;
        for j in 0..n {
            let k = strength[m * n + j];
            if j == m || k == 0.0 {
                continue;
            }
            let delta = coords[m] - coords[j];
            let d = delta.length().max(1e-9);
            let t = target[m * n + j];
            let d3 = d * d * d;
            dxx += k * (1.0 - t * delta.y * delta.y / d3);
            dyy += k * (1.0 - t * delta.x * delta.x / d3);
            dxy += k * t * delta.x * delta.y / d3;
        }

        let g = forces[m];
        let det = dxx * dyy - dxy * dxy;
        let mut step = if det.abs() < 1e-12 {
            -g * (0.1 * bond_length / g.length().max(1e-9))
        } else {
            Vec2::new(
                (-g.x * dyy + g.y * dxy) / det,
                (-g.y * dxx + g.x * dxy) / det,
            )
        };
        let step_len = step.length();
        if step_len > bond_length {
            step = step * (bond_length / step_len);
        }
        coords[m] = coords[m] + step;

        for (i, f) in forces.iter_mut().enumerate() {
            *f = gradient(coords, i);
        }
    }
}

fn build_matrices(
    coords: &[Vec2],
    bonds: &[(usize, usize)],
    rings: &[Vec<usize>],
    bond_length: f64,
    n: usize,
) -> (Vec<f64>, Vec<f64>) {
    let mut target = vec![0.0; n * n];
    let mut strength = vec![0.0; n * n];
    let mut set = |t: &mut Vec<f64>, s: &mut Vec<f64>, i: usize, j: usize, tv: f64, sv: f64| {
        t[i * n + j] = tv;
        t[j * n + i] = tv;
        s[i * n + j] = sv;
        s[j * n + i] = sv;
    };

    let mut bonded = vec![false; n * n];
    for &(a, b) in bonds {
        bonded[a * n + b] = true;
        bonded[b * n + a] = true;
    }

    // Badness of the starting geometry: summed relative bond-length
    // deviation plus one unit per non-bonded close contact.
    let mut badness = 0.0;
    for &(a, b) in bonds {
        badness += (coords[a].distance(coords[b]) - bond_length).abs() / bond_length;
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if !bonded[i * n + j] && coords[i].distance(coords[j]) < 0.7 * bond_length {
                badness += 1.0;
            }
        }
    }
    let include_far = badness > 0.1 * n as f64;

    if include_far {
        let topo = topological_distances(bonds, n);
        for i in 0..n {
            for j in (i + 1)..n {
                let d = topo[i * n + j];
                if d == usize::MAX || d < 2 {
                    continue;
                }
                let t = d as f64 * bond_length;
                set(&mut target, &mut strength, i, j, t, 0.3 / (t * t));
            }
        }
    }

    // Smaller rings written last so their (tighter) chords win shared pairs.
    let mut by_size: Vec<&Vec<usize>> = rings.iter().collect();
    by_size.sort_by(|a, b| b.len().cmp(&a.len()));
    for cycle in by_size {
        let rs = cycle.len();
        if rs < 3 {
            continue;
        }
        let r = circumradius(rs, bond_length);
        for i in 0..rs {
            for j in (i + 1)..rs {
                let steps = (j - i).min(rs - (j - i));
                let chord = 2.0 * r * (PI * steps as f64 / rs as f64).sin();
                let sv = 1.0 / (rs as f64 * chord * chord);
                set(&mut target, &mut strength, cycle[i], cycle[j], chord, sv);
            }
        }
    }

    let bond_strength = 1.0 / (bond_length * bond_length);
    for &(a, b) in bonds {
        set(&mut target, &mut strength, a, b, bond_length, bond_strength);
    }

    (target, strength)
}

fn topological_distances(bonds: &[(usize, usize)], n: usize) -> Vec<usize> {
    let mut adjacency = vec![Vec::new(); n];
    for &(a, b) in bonds {
        adjacency[a].push(b);
        adjacency[b].push(a);
    }
    let mut dist = vec![usize::MAX; n * n];
    for start in 0..n {
        dist[start * n + start] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(start);
        while let Some(cur) = queue.pop_front() {
            let d = dist[start * n + cur];
            for &next in &adjacency[cur] {
                if dist[start * n + next] == usize::MAX {
                    dist[start * n + next] = d + 1;
                    queue.push_back(next);
                }
            }
        }
    }
    dist
}
