//! The `Term` value type: a (field, text) pair.

use serde::{Deserialize, Serialize};

/// An indexed term: a field name paired with its text. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    pub field: String,
    pub text: String,
}

impl Term {
    pub fn new(field: impl Into<String>, text: impl Into<String>) -> Self {
        Term {
            field: field.into(),
            text: text.into(),
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.field, self.text)
    }
}

/// A boost value with bit-pattern equality and hashing, so that query
/// variants carrying an `f32` boost can still derive `Eq`/`Hash` (two
/// queries that differ only in boost are not equal, per the data model).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Boost(pub f32);

impl Boost {
    pub const DEFAULT: Boost = Boost(1.0);

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for Boost {
    fn default() -> Self {
        Boost::DEFAULT
    }
}

impl From<f32> for Boost {
    fn from(f: f32) -> Self {
        Boost(f)
    }
}

impl PartialEq for Boost {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Boost {}

impl std::hash::Hash for Boost {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl std::fmt::Display for Boost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
