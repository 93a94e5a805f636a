//! Stable identifiers for synthesized doubles.
//!
//! A [`DoubleId`] is a newtype over `u32` indexing the engine's arena of
//! doubles. It is also the runtime identity of a double: two values refer to
//! the same double exactly when their ids are equal.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a synthesized double.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DoubleId(pub u32);

impl DoubleId {
    /// Arena slot of this double.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DoubleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "double#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_id_display() {
        assert_eq!(format!("{}", DoubleId(7)), "double#7");
    }

    #[test]
    fn double_id_index() {
        assert_eq!(DoubleId(3).index(), 3);
    }

    #[test]
    fn serde_roundtrip() {
        let id = DoubleId(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: DoubleId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
