//! Stable name hashes for parameters.

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Stable identifier of a parameter: the 32-bit FNV-1a hash of its name.
///
/// The hash is computed the same way at bake time and at runtime, so gameplay code can address
/// parameters without holding on to strings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterId(pub u32);

impl ParameterId {
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }
}

impl From<&str> for ParameterId {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

/// Wraps an already hashed id, as stored by bake tools.
impl From<u32> for ParameterId {
    fn from(hash: u32) -> Self {
        Self(hash)
    }
}

impl std::fmt::Display for ParameterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
