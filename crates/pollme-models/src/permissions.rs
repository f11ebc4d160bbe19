use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Per-user grants. Poll ownership is checked separately; these bits
    /// only gate actions that have no owner to compare against.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: i64 {
        const ADD_POLL = 1 << 0;
    }
}

impl Permissions {
    /// Grants handed to self-registered accounts when the server allows it.
    pub const REGISTERED_DEFAULT: Permissions = Self::ADD_POLL;
}

impl Serialize for Permissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.bits())
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = i64::deserialize(deserializer)?;
        Ok(Permissions::from_bits_truncate(bits))
    }
}
