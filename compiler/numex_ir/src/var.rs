//! Variable descriptors and binding addresses.

use crate::{Dtype, MAX_VARS};

/// Backing storage for synthetic addresses. Never read; only its element
/// addresses are used, as unique tokens.
static SYNTHETIC_POOL: [u8; MAX_VARS] = [0; MAX_VARS];

/// Opaque identity of a variable's data.
///
/// Callers may supply their own (for example the address of their buffer).
/// Variables without one are bound by position and receive a synthetic
/// address from a fixed pool, so later passes can tell variables apart
/// before any real buffer exists.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct VarAddress(usize);

impl VarAddress {
    #[inline]
    pub const fn new(raw: usize) -> Self {
        VarAddress(raw)
    }

    #[inline]
    pub const fn raw(self) -> usize {
        self.0
    }

    /// Whether this address came from the synthetic pool (a range test).
    #[inline]
    pub fn is_synthetic(self) -> bool {
        self.synthetic_index().is_some()
    }

    /// Position in the synthetic pool, if this is a synthetic address.
    pub fn synthetic_index(self) -> Option<usize> {
        let base = pool_base();
        if self.0 >= base && self.0 < base + MAX_VARS {
            Some(self.0 - base)
        } else {
            None
        }
    }
}

#[inline]
fn pool_base() -> usize {
    std::ptr::addr_of!(SYNTHETIC_POOL) as usize
}

/// Synthetic address for the variable at `position`.
///
/// Positions beyond the pool are an internal error: the compiler rejects
/// more than `MAX_VARS` variables before assigning addresses.
pub fn synthetic_address(position: usize) -> VarAddress {
    assert!(
        position < MAX_VARS,
        "synthetic address {position} outside the {MAX_VARS}-entry pool"
    );
    VarAddress(pool_base() + position)
}

/// A caller-declared input variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarDesc {
    pub name: String,
    pub dtype: Dtype,
    /// Element width in bytes. Derived from the dtype except for strings.
    pub itemsize: usize,
    /// `None` binds the variable by position.
    pub address: Option<VarAddress>,
}

impl VarDesc {
    pub fn new(name: impl Into<String>, dtype: Dtype) -> Self {
        VarDesc {
            name: name.into(),
            dtype,
            itemsize: dtype.size(),
            address: None,
        }
    }

    /// A fixed-width string variable holding up to `chars` UCS-4 code units.
    pub fn string(name: impl Into<String>, chars: usize) -> Self {
        VarDesc {
            name: name.into(),
            dtype: Dtype::String,
            itemsize: chars * 4,
            address: None,
        }
    }

    #[must_use]
    pub fn with_address(mut self, address: VarAddress) -> Self {
        self.address = Some(address);
        self
    }
}
