use std::fmt;

use ndarray::Array1;

/// Label attached to a stored identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityLabel {
    /// Human-assigned name loaded from the seed; immutable during a run.
    Known(String),
    /// Generated on registration, rendered as `unknown-N`. Never reused.
    Unknown(u64),
}

impl IdentityLabel {
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl fmt::Display for IdentityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(name) => f.write_str(name),
            Self::Unknown(n) => write!(f, "unknown-{}", n),
        }
    }
}

/// A stored feature vector and its label.
#[derive(Debug, Clone)]
pub struct IdentityRecord {
    pub label: IdentityLabel,
    pub feature_vector: Array1<f32>,
}

impl IdentityRecord {
    pub fn new(label: IdentityLabel, feature_vector: Array1<f32>) -> Self {
        Self {
            label,
            feature_vector,
        }
    }

    pub fn dimension(&self) -> usize {
        self.feature_vector.len()
    }
}
