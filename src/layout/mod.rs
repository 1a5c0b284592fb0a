//! 2-D depiction coordinates for molecular graphs.
//!
//! Produces conventional structure diagrams: every bond drawn at a fixed
//! nominal length, 120 degree chain angles with zig-zag alternation, ring
//! systems as rigid precomputed bodies, cis/trans double bonds drawn on the
//! correct sides, and disconnected components tiled into a grid.
//!
//! ```
//! use sketchcrab::{generate_coordinates, smiles::from_smiles};
//!
//! let mol = from_smiles("CC(C)Cc1ccc(C(C)C(=O)O)cc1").unwrap();
//! let coords = generate_coordinates(&mol).unwrap();
//! assert_eq!(coords.len(), mol.atom_count());
//! ```

use std::collections::HashSet;
use std::fmt;

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::layout::geometry::{Bounds, Vec2};
use crate::layout::place::{run_search, PlacedState};
use crate::layout::priority::atom_priorities;
use crate::layout::rings::{build_rings, merge_ring_systems, RingSystem, SpiroLink};
use crate::layout::tree::build_tree;
use crate::mol::Mol;
use crate::rings::Sssr;
use crate::traits::{HasBondStereo, HasPosition2D};
use crate::wrappers::WithPosition2D;

pub(crate) mod geometry;
mod place;
mod priority;
mod relax;
mod ring_geometry;
mod rings;
mod tree;

/// Tunables for coordinate generation. `Default` gives conventional
/// depiction settings; all distances are in the same unit as
/// `bond_length`.
#[derive(Debug, Clone)]
pub struct LayoutParams {
    /// Nominal bond length every non-relaxed bond is drawn at.
    pub bond_length: f64,
    /// Two non-bonded items closer than this count as a collision.
    pub collision_radius: f64,
    /// Horizontal gap between tiled components.
    pub component_gap: f64,
    /// Vertical gap between tile rows.
    pub row_gap: f64,
    /// Cap on candidate variants per node once strict mode is dropped.
    pub max_variants: usize,
    /// Subtree failures tolerated before the search escalates.
    pub fail_budget: u32,
    /// Relative convergence tolerance for ring-system relaxation.
    pub relax_tolerance: f64,
    /// Iteration cap for ring-system relaxation.
    pub relax_max_iter: usize,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            bond_length: 1.5,
            collision_radius: 0.75,
            component_gap: 3.0,
            row_gap: 3.0,
            max_variants: 18,
            fail_budget: 500,
            relax_tolerance: 1e-3,
            relax_max_iter: 200,
        }
    }
}

/// Malformed input rejected before any layout work starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// A bond whose two endpoints are the same atom.
    SelfLoopBond(NodeIndex),
    /// More than one bond between the same pair of atoms.
    ParallelBond(NodeIndex, NodeIndex),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfLoopBond(atom) => {
                write!(f, "cannot lay out a self-loop bond on atom {}", atom.index())
            }
            Self::ParallelBond(a, b) => write!(
                f,
                "cannot lay out parallel bonds between atoms {} and {}",
                a.index(),
                b.index()
            ),
        }
    }
}

impl std::error::Error for LayoutError {}

/// Coordinate generator with reusable scratch state.
///
/// A single engine can lay out any number of molecules; the placement
/// scratch is cleared at the start of every call and never shared between
/// two components in flight.
pub struct LayoutEngine {
    params: LayoutParams,
    scratch: PlacedState,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self::with_params(LayoutParams::default())
    }

    pub fn with_params(params: LayoutParams) -> Self {
        Self {
            params,
            scratch: PlacedState::new(),
        }
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// Computes one coordinate per atom, indexed by `NodeIndex::index`.
    ///
    /// Fails only on malformed input; the search itself always converges.
    pub fn layout<A, B: HasBondStereo>(
        &mut self,
        mol: &Mol<A, B>,
    ) -> Result<Vec<[f64; 2]>, LayoutError> {
        validate(mol)?;
        if mol.atom_count() == 0 {
            return Ok(Vec::new());
        }

        let sssr = Sssr::perceive(mol);
        let priorities = atom_priorities(mol, &sssr);
        let rings = build_rings(mol, &sssr, &priorities);
        let (systems, spiro) = merge_ring_systems(rings);
        let components = crate::graph_ops::connected_components(mol);
        let (per_component_systems, per_component_spiro) =
            split_by_component(&components, systems, spiro, mol.atom_count());

        let mut placements = Vec::with_capacity(components.len());
        for (ci, component) in components.iter().enumerate() {
            debug!(component = ci, atoms = component.len(), "laying out component");
            let tree = build_tree(
                mol,
                component,
                per_component_systems[ci].clone(),
                &per_component_spiro[ci],
                &priorities,
                &self.params,
            );
            self.scratch.clear(mol.atom_count());
            run_search(&tree, &mut self.scratch, &self.params);

            let mut bounds = Bounds::new();
            let coords: Vec<(NodeIndex, Vec2)> = component
                .iter()
                .map(|&a| {
                    let p = self.scratch.position(a).unwrap_or(Vec2::ZERO);
                    bounds.include(p);
                    (a, p)
                })
                .collect();
            placements.push((coords, bounds));
        }

        let mut out = vec![[0.0, 0.0]; mol.atom_count()];
        tile_components(&mut placements, &self.params);
        for (coords, _) in &placements {
            for &(a, p) in coords {
                out[a.index()] = [p.x, p.y];
            }
        }
        Ok(out)
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn validate<A, B>(mol: &Mol<A, B>) -> Result<(), LayoutError> {
    let mut seen = HashSet::new();
    for bond in mol.bonds() {
        if let Some((a, b)) = mol.bond_endpoints(bond) {
            if a == b {
                return Err(LayoutError::SelfLoopBond(a));
            }
            let key = if a.index() < b.index() { (a, b) } else { (b, a) };
            if !seen.insert(key) {
                return Err(LayoutError::ParallelBond(key.0, key.1));
            }
        }
    }
    Ok(())
}

/// Partitions ring systems and spiro links per connected component,
/// re-indexing spiro system references into the per-component lists.
fn split_by_component(
    components: &[Vec<NodeIndex>],
    systems: Vec<RingSystem>,
    spiro: Vec<SpiroLink>,
    atom_count: usize,
) -> (Vec<Vec<RingSystem>>, Vec<Vec<SpiroLink>>) {
    let mut component_of = vec![0usize; atom_count];
    for (ci, component) in components.iter().enumerate() {
        for &a in component {
            component_of[a.index()] = ci;
        }
    }

    let mut out_systems: Vec<Vec<RingSystem>> = vec![Vec::new(); components.len()];
    let mut relocated = Vec::with_capacity(systems.len());
    for system in systems {
        let ci = component_of[system.atoms[0].index()];
        relocated.push((ci, out_systems[ci].len()));
        out_systems[ci].push(system);
    }

    let mut out_spiro: Vec<Vec<SpiroLink>> = vec![Vec::new(); components.len()];
    for link in spiro {
        let (ci, first) = relocated[link.systems[0]];
        let (_, second) = relocated[link.systems[1]];
        out_spiro[ci].push(SpiroLink {
            systems: [first, second],
            atom: link.atom,
        });
    }
    (out_systems, out_spiro)
}

/// Translates each component into a roughly square grid: rows of
/// `ceil(sqrt(n))`, members left to right with a horizontal gap, each row
/// vertically centered, rows advancing downward by the row's max height.
fn tile_components(placements: &mut [(Vec<(NodeIndex, Vec2)>, Bounds)], params: &LayoutParams) {
    if placements.len() < 2 {
        return;
    }
    let per_row = (placements.len() as f64).sqrt().ceil() as usize;
    let mut y_cursor = 0.0;
    for row in placements.chunks_mut(per_row) {
        let row_height = row
            .iter()
            .map(|(_, b)| b.height())
            .fold(0.0f64, f64::max);
        let mid = y_cursor - row_height / 2.0;
        let mut x_cursor = 0.0;
        for (coords, bounds) in row.iter_mut() {
            let shift = Vec2::new(
                x_cursor - bounds.min_x,
                mid - bounds.center().y,
            );
            for (_, p) in coords.iter_mut() {
                *p = *p + shift;
            }
            x_cursor += bounds.width() + params.component_gap;
        }
        y_cursor -= row_height + params.row_gap;
    }
}

/// One-shot layout with default parameters.
pub fn generate_coordinates<A, B: HasBondStereo>(
    mol: &Mol<A, B>,
) -> Result<Vec<[f64; 2]>, LayoutError> {
    LayoutEngine::new().layout(mol)
}

/// One-shot layout with explicit parameters.
pub fn generate_coordinates_with<A, B: HasBondStereo>(
    mol: &Mol<A, B>,
    params: LayoutParams,
) -> Result<Vec<[f64; 2]>, LayoutError> {
    LayoutEngine::with_params(params).layout(mol)
}

/// Lays out `mol` and returns a copy whose atoms carry their position.
pub fn assign_coordinates<A: Clone, B: Clone + HasBondStereo>(
    mol: &Mol<A, B>,
) -> Result<Mol<WithPosition2D<A>, B>, LayoutError> {
    let coords = generate_coordinates(mol)?;
    let mut positioned = mol.map(
        |_, atom| WithPosition2D::new(atom.clone()),
        |_, bond| bond.clone(),
    );
    for atom in positioned.atoms().collect::<Vec<_>>() {
        positioned
            .atom_mut(atom)
            .set_position_2d(Some(coords[atom.index()]));
    }
    Ok(positioned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::bond::Bond;
    use crate::smiles::from_smiles;

    #[test]
    fn empty_molecule_yields_empty_output() {
        let mol: Mol<Atom, Bond> = Mol::new();
        assert!(generate_coordinates(&mol).unwrap().is_empty());
    }

    #[test]
    fn single_atom_at_origin() {
        let mol = from_smiles("C").unwrap();
        let coords = generate_coordinates(&mol).unwrap();
        assert_eq!(coords, vec![[0.0, 0.0]]);
    }

    #[test]
    fn self_loop_is_rejected() {
        let mut mol: Mol<Atom, Bond> = Mol::new();
        let a = mol.add_atom(Atom::default());
        mol.add_bond(a, a, Bond::default());
        assert_eq!(
            generate_coordinates(&mol),
            Err(LayoutError::SelfLoopBond(a))
        );
    }

    #[test]
    fn parallel_bond_is_rejected() {
        let mut mol: Mol<Atom, Bond> = Mol::new();
        let a = mol.add_atom(Atom::default());
        let b = mol.add_atom(Atom::default());
        mol.add_bond(a, b, Bond::default());
        mol.add_bond(b, a, Bond::default());
        assert_eq!(
            generate_coordinates(&mol),
            Err(LayoutError::ParallelBond(a, b))
        );
    }

    #[test]
    fn output_is_dense_and_finite() {
        let mol = from_smiles("CC(C)Cc1ccc(cc1)C(C)C(=O)O").unwrap();
        let coords = generate_coordinates(&mol).unwrap();
        assert_eq!(coords.len(), mol.atom_count());
        for p in &coords {
            assert!(p[0].is_finite() && p[1].is_finite());
        }
    }

    #[test]
    fn disjoint_components_do_not_overlap() {
        let mol = from_smiles("c1ccccc1.c1ccccc1").unwrap();
        let coords = generate_coordinates(&mol).unwrap();
        let gap = LayoutParams::default().component_gap;
        let max_x_first = coords[..6].iter().map(|p| p[0]).fold(f64::MIN, f64::max);
        let min_x_second = coords[6..].iter().map(|p| p[0]).fold(f64::MAX, f64::min);
        assert!(min_x_second - max_x_first >= gap - 1e-6);
    }

    #[test]
    fn disjoint_components_align_vertically() {
        let mol = from_smiles("c1ccccc1.c1ccccc1").unwrap();
        let coords = generate_coordinates(&mol).unwrap();
        let center_y = |ps: &[[f64; 2]]| ps.iter().map(|p| p[1]).sum::<f64>() / ps.len() as f64;
        assert!((center_y(&coords[..6]) - center_y(&coords[6..])).abs() < 1e-6);
    }

    #[test]
    fn engine_is_reusable_and_deterministic() {
        let mol = from_smiles("CC(C)Cc1ccccc1").unwrap();
        let mut engine = LayoutEngine::new();
        let first = engine.layout(&mol).unwrap();
        let second = engine.layout(&mol).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, generate_coordinates(&mol).unwrap());
    }

    #[test]
    fn assigned_positions_match_generated() {
        let mol = from_smiles("CCO").unwrap();
        let coords = generate_coordinates(&mol).unwrap();
        let positioned = assign_coordinates(&mol).unwrap();
        for a in positioned.atoms() {
            assert_eq!(
                positioned.atom(a).position_2d(),
                Some(coords[a.index()])
            );
        }
    }

    #[test]
    fn custom_bond_length_scales_output() {
        let mol = from_smiles("CC").unwrap();
        let params = LayoutParams {
            bond_length: 2.0,
            ..LayoutParams::default()
        };
        let coords = generate_coordinates_with(&mol, params).unwrap();
        let dx = coords[1][0] - coords[0][0];
        let dy = coords[1][1] - coords[0][1];
        assert!((dx.hypot(dy) - 2.0).abs() < 1e-9);
    }
}
