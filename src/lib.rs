pub mod atom;
pub mod bond;
pub mod element;
pub mod graph_ops;
pub mod kekulize;
pub mod layout;
pub mod mol;
pub mod rings;
pub mod smiles;
pub mod traits;
pub mod wrappers;

pub use atom::Atom;
pub use bond::{Bond, BondOrder, BondStereo, SmilesBond, SmilesBondOrder};
pub use element::Element;
pub use kekulize::{kekulize, KekulizeError};
pub use layout::{
    assign_coordinates, generate_coordinates, generate_coordinates_with, LayoutEngine,
    LayoutError, LayoutParams,
};
pub use mol::Mol;
pub use rings::Sssr;
pub use smiles::{from_smiles, parse_smiles, SmilesError};
pub use traits::{
    HasAromaticity, HasAtomicNum, HasBondOrder, HasBondStereo, HasFormalCharge,
    HasHydrogenCount, HasIsotope, HasPosition2D,
};
pub use wrappers::WithPosition2D;

#[cfg(test)]
mod tests;
