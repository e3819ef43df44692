//! Record identifiers.
//!
//! Every referenceable record in a message carries a signed 32-bit identifier.
//! Producers assign positive identifiers to objects and libraries and negative
//! identifiers to value types written inline; zero means "no identifier".

use std::fmt;

/// Identifier naming a record within one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Id(i32);

impl Id {
    /// The null identifier ("no identifier / no reference").
    pub const NULL: Id = Id(0);

    /// Creates an identifier from its wire value.
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the wire value.
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Returns true if this is the null identifier.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl From<i32> for Id {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<Id> for i32 {
    fn from(id: Id) -> Self {
        id.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_id() {
        assert!(Id::NULL.is_null());
        assert!(!Id::new(-3).is_null());
        assert_eq!(Id::default(), Id::NULL);
    }

    #[test]
    fn test_display() {
        assert_eq!(Id::new(42).to_string(), "#42");
        assert_eq!(Id::new(-1).to_string(), "#-1");
    }
}
