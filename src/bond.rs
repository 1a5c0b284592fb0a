use petgraph::graph::NodeIndex;

/// Kekulé bond order. Every bond in a finished [`Mol`](crate::Mol) has one
/// of these concrete orders; aromaticity is a property of atoms, resolved by
/// [`kekulize`](crate::kekulize::kekulize) during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
}

/// Planar stereochemistry constraint on a bond, usually a double bond.
///
/// The two node indices name one substituent at each end of the constrained
/// bond. `Cis` requires them on the same side of the bond line in the laid-out
/// diagram, `Trans` on opposite sides. `Either` marks a bond whose
/// configuration is explicitly unknown; layout treats it like `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondStereo {
    #[default]
    None,
    Cis(NodeIndex, NodeIndex),
    Trans(NodeIndex, NodeIndex),
    Either,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    pub order: BondOrder,
    pub stereo: BondStereo,
}

impl Default for Bond {
    fn default() -> Self {
        Self {
            order: BondOrder::Single,
            stereo: BondStereo::None,
        }
    }
}

impl Bond {
    pub fn new(order: BondOrder) -> Self {
        Self {
            order,
            stereo: BondStereo::None,
        }
    }
}

impl crate::traits::HasBondOrder for Bond {
    fn bond_order(&self) -> BondOrder {
        self.order
    }
}

impl crate::traits::HasBondStereo for Bond {
    fn bond_stereo(&self) -> BondStereo {
        self.stereo
    }
}

/// Bond order as written in SMILES, before kekulization.
///
/// `Implicit` is the unwritten bond between adjacent atoms; it resolves to
/// single or aromatic depending on the atoms it joins. `Aromatic` only
/// survives until [`kekulize`](crate::kekulize::kekulize) runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SmilesBondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
    #[default]
    Implicit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmilesBond {
    pub order: SmilesBondOrder,
    pub stereo: BondStereo,
}

impl Default for SmilesBond {
    fn default() -> Self {
        Self {
            order: SmilesBondOrder::Implicit,
            stereo: BondStereo::None,
        }
    }
}

impl SmilesBond {
    pub fn new(order: SmilesBondOrder) -> Self {
        Self {
            order,
            stereo: BondStereo::None,
        }
    }
}

impl crate::traits::HasBondStereo for SmilesBond {
    fn bond_stereo(&self) -> BondStereo {
        self.stereo
    }
}
