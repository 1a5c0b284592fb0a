use crate::traits::*;

/// Wraps an atom (or any node weight) with an optional 2D position.
///
/// Layout produces a `Mol<WithPosition2D<A>, B>` from a `Mol<A, B>`; the
/// inner weight is untouched and all its traits still apply through
/// delegation.
#[derive(Debug, Clone, PartialEq)]
pub struct WithPosition2D<T> {
    pub inner: T,
    pub position_2d: Option<[f64; 2]>,
}

impl<T> WithPosition2D<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            position_2d: None,
        }
    }
}

impl<T> HasPosition2D for WithPosition2D<T> {
    fn position_2d(&self) -> Option<[f64; 2]> {
        self.position_2d
    }
    fn set_position_2d(&mut self, pos: Option<[f64; 2]>) {
        self.position_2d = pos;
    }
}

macro_rules! delegate_trait {
    ($wrapper:ident, $trait:ident, $method:ident, $ret:ty) => {
        impl<T: $trait> $trait for $wrapper<T> {
            fn $method(&self) -> $ret {
                self.inner.$method()
            }
        }
    };
}

macro_rules! delegate_common {
    ($wrapper:ident) => {
        delegate_trait!($wrapper, HasAtomicNum, atomic_num, u8);
        delegate_trait!($wrapper, HasFormalCharge, formal_charge, i8);
        delegate_trait!($wrapper, HasIsotope, isotope, u16);
        delegate_trait!($wrapper, HasHydrogenCount, hydrogen_count, u8);
        delegate_trait!($wrapper, HasAromaticity, is_aromatic, bool);
        delegate_trait!($wrapper, HasBondOrder, bond_order, crate::bond::BondOrder);
        delegate_trait!(
            $wrapper,
            HasBondStereo,
            bond_stereo,
            crate::bond::BondStereo
        );
    };
}

delegate_common!(WithPosition2D);
