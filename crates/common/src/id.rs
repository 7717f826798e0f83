//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based row ID.
    ///
    /// ULIDs sort by creation time, so ordering by ID matches insertion order
    /// across shows, categories and nominations.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an opaque device identity for a voter cookie.
    ///
    /// Random v4 so the token carries no timestamp.
    #[must_use]
    pub fn generate_device_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_eq!(id2.len(), 26);
        assert_ne!(id1, id2);
        assert_eq!(id1, id1.to_lowercase());
    }

    #[test]
    fn test_generate_device_id() {
        let id_gen = IdGenerator::new();
        let device = id_gen.generate_device_id();

        assert_eq!(device.len(), 36);
        assert!(Uuid::parse_str(&device).is_ok());
    }
}
