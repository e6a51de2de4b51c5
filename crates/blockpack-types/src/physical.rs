use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Name of the physical storage blob that holds a pack.
///
/// Unlike [`ContentId`](crate::ContentId) this is not derived from content:
/// the pack assembler picks it once, when the pack is sealed, and the storage
/// layer uses it as the blob key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhysicalBlockId(String);

impl PhysicalBlockId {
    /// Prefix used by [`PhysicalBlockId::random`].
    pub const PACK_PREFIX: &'static str = "p";

    /// Wrap an existing blob name. Empty names are rejected.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::EmptyIdentifier);
        }
        Ok(Self(name))
    }

    /// Mint a fresh, random pack name (`p` followed by 32 hex characters).
    pub fn random() -> Self {
        let mut bytes = [0u8; 16];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self(format!("{}{}", Self::PACK_PREFIX, hex::encode(bytes)))
    }

    /// The blob name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PhysicalBlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysicalBlockId({})", self.0)
    }
}

impl fmt::Display for PhysicalBlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhysicalBlockId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PhysicalBlockId> for String {
    fn from(id: PhysicalBlockId) -> Self {
        id.0
    }
}
