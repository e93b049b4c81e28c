//! Feature-vector registry: recognition of known identities and
//! deduplicated registration of unknown ones.

use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info};
use ndarray::{Array1, ArrayView1};

use crate::error::SeedError;
use crate::identity::metric::{self, face_confidence};
use crate::identity::record::{IdentityLabel, IdentityRecord};

/// Label reported for faces that match no stored identity.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Thresholds for the registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistryConfig {
    /// Maximum distance for a stored identity to count as a match
    pub match_threshold: f32,
    /// Maximum distance for a new vector to count as already registered
    pub duplicate_threshold: f32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.6,
            duplicate_threshold: 0.6,
        }
    }
}

/// Closest stored identity for a query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch {
    pub index: usize,
    pub label: IdentityLabel,
    pub distance: f32,
}

/// Outcome of [`IdentityRegistry::identify`].
#[derive(Debug, Clone, PartialEq)]
pub enum Identification {
    Matched {
        label: IdentityLabel,
        distance: f32,
        /// Percent confidence from [`face_confidence`]
        confidence: f32,
    },
    Unknown {
        /// Label issued if the vector was registered as a new unknown
        registered: Option<IdentityLabel>,
    },
}

impl Identification {
    /// Display label: the matched identity, or `"Unknown"`.
    pub fn label(&self) -> String {
        match self {
            Self::Matched { label, .. } => label.to_string(),
            Self::Unknown { .. } => UNKNOWN_LABEL.to_string(),
        }
    }

    pub fn score(&self) -> Option<f32> {
        match self {
            Self::Matched { confidence, .. } => Some(*confidence),
            Self::Unknown { .. } => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// Ordered store of identity records.
///
/// Insertion order is preserved and breaks ties between equal distances:
/// the record inserted first wins. Records are never removed and issued
/// `unknown-N` labels are never reused.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    records: Vec<IdentityRecord>,
    unknown_counter: u64,
    config: RegistryConfig,
}

impl IdentityRegistry {
    /// Create an empty registry with the given thresholds.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            records: Vec::new(),
            unknown_counter: 0,
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Number of stored records, known and unknown.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stored records in insertion order.
    pub fn records(&self) -> &[IdentityRecord] {
        &self.records
    }

    /// Number of unknown labels issued so far.
    pub fn unknown_counter(&self) -> u64 {
        self.unknown_counter
    }

    /// Length of stored vectors, fixed by the first record.
    pub fn dimension(&self) -> Option<usize> {
        self.records.first().map(IdentityRecord::dimension)
    }

    /// Add a known identity from the startup seed.
    pub fn add_known(&mut self, label: impl Into<String>, vector: Vec<f32>) -> Result<(), SeedError> {
        let label = label.into();
        if vector.is_empty() {
            return Err(SeedError::EmptyVector { label });
        }
        if !vector.iter().all(|v| v.is_finite()) {
            return Err(SeedError::NonFinite { label });
        }
        if let Some(expected) = self.dimension() {
            if vector.len() != expected {
                return Err(SeedError::DimensionMismatch {
                    label,
                    expected,
                    got: vector.len(),
                });
            }
        }
        self.records
            .push(IdentityRecord::new(IdentityLabel::Known(label), Array1::from(vector)));
        Ok(())
    }

    /// Load `(label, vector)` pairs from a seed. Returns the number added.
    pub fn seed<I>(&mut self, pairs: I) -> Result<usize, SeedError>
    where
        I: IntoIterator<Item = (String, Vec<f32>)>,
    {
        let mut added = 0;
        for (label, vector) in pairs {
            self.add_known(label, vector)?;
            added += 1;
        }
        info!("identity registry seeded with {} known identities", added);
        Ok(added)
    }

    /// Non-empty, finite, and of the registry's dimension.
    fn accepts(&self, vector: &[f32]) -> bool {
        !vector.is_empty()
            && vector.iter().all(|v| v.is_finite())
            && self.dimension().is_none_or(|d| d == vector.len())
    }

    /// Closest stored record, regardless of threshold.
    pub fn best_match(&self, vector: &[f32]) -> Option<BestMatch> {
        if self.records.is_empty() || !self.accepts(vector) {
            return None;
        }
        let query = ArrayView1::from(vector);
        let distances =
            metric::distance_batch(self.records.iter().map(|r| r.feature_vector.view()), query);
        let (index, distance) = metric::argmin(&distances)?;
        Some(BestMatch {
            index,
            label: self.records[index].label.clone(),
            distance,
        })
    }

    /// Recognise `vector`, registering it as a new unknown if nothing matches.
    ///
    /// An empty registry reports Unknown without registering.
    pub fn identify(&mut self, vector: &[f32]) -> Identification {
        if self.records.is_empty() {
            return Identification::Unknown { registered: None };
        }
        if let Some(found) = self.match_known(vector) {
            return found;
        }
        Identification::Unknown {
            registered: self.register_novel(vector),
        }
    }

    /// Read-only half of [`identify`](Self::identify).
    pub fn match_known(&self, vector: &[f32]) -> Option<Identification> {
        let best = self.best_match(vector)?;
        if best.distance <= self.config.match_threshold {
            Some(Identification::Matched {
                confidence: face_confidence(best.distance, self.config.match_threshold),
                label: best.label,
                distance: best.distance,
            })
        } else {
            None
        }
    }

    /// True iff some stored record lies within the duplicate threshold.
    pub fn is_duplicate(&self, vector: &[f32]) -> bool {
        if !self.accepts(vector) {
            return false;
        }
        let query = ArrayView1::from(vector);
        self.records.iter().any(|r| {
            metric::euclidean(r.feature_vector.view(), query)
                .is_some_and(|d| d <= self.config.duplicate_threshold)
        })
    }

    /// Register `vector` as a new unknown unless it duplicates a stored one.
    ///
    /// Returns `true` if a record was added.
    pub fn register_if_novel(&mut self, vector: &[f32]) -> bool {
        self.register_novel(vector).is_some()
    }

    /// Like [`register_if_novel`](Self::register_if_novel), returning the
    /// issued label.
    pub fn register_novel(&mut self, vector: &[f32]) -> Option<IdentityLabel> {
        if !self.accepts(vector) {
            debug!("ignoring unusable feature vector of length {}", vector.len());
            return None;
        }
        if self.is_duplicate(vector) {
            debug!("unknown face already registered, skipping");
            return None;
        }
        let label = IdentityLabel::Unknown(self.unknown_counter);
        self.unknown_counter += 1;
        info!("registered new identity {}", label);
        self.records
            .push(IdentityRecord::new(label.clone(), Array1::from(vector.to_vec())));
        Some(label)
    }
}

/// Registry shared between camera streams.
///
/// Lookups take the read lock; registration takes the single write lock and
/// re-checks under it, so two streams cannot register the same face twice.
#[derive(Debug, Clone, Default)]
pub struct SharedIdentityRegistry {
    inner: Arc<RwLock<IdentityRegistry>>,
}

impl SharedIdentityRegistry {
    pub fn new(registry: IdentityRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    pub fn identify(&self, vector: &[f32]) -> Identification {
        {
            let registry = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            if registry.is_empty() {
                return Identification::Unknown { registered: None };
            }
            if let Some(found) = registry.match_known(vector) {
                return found;
            }
        }
        let mut registry = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        registry.identify(vector)
    }

    /// See [`IdentityRegistry::seed`].
    pub fn seed<I>(&self, pairs: I) -> Result<usize, SeedError>
    where
        I: IntoIterator<Item = (String, Vec<f32>)>,
    {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .seed(pairs)
    }

    pub fn register_if_novel(&self, vector: &[f32]) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register_if_novel(vector)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> IdentityRegistry {
        let mut registry = IdentityRegistry::default();
        registry
            .seed(vec![
                ("alice".to_string(), vec![0.0, 0.0, 0.0]),
                ("bob".to_string(), vec![1.0, 1.0, 1.0]),
            ])
            .unwrap();
        registry
    }

    #[test]
    fn test_empty_registry_does_not_register() {
        let mut registry = IdentityRegistry::default();
        let result = registry.identify(&[0.1, 0.2]);
        assert_eq!(result, Identification::Unknown { registered: None });
        assert_eq!(result.label(), "Unknown");
        assert_eq!(result.score(), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_identify_known() {
        let mut registry = seeded();
        let result = registry.identify(&[0.1, 0.0, 0.0]);
        assert_eq!(result.label(), "alice");
        assert!(result.score().unwrap() > 89.0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_exact_match_scores_100() {
        let mut registry = seeded();
        assert_eq!(registry.identify(&[1.0, 1.0, 1.0]).score(), Some(100.0));
    }

    #[test]
    fn test_identify_is_idempotent_on_match() {
        let mut registry = seeded();
        let first = registry.identify(&[0.9, 1.0, 1.0]);
        let second = registry.identify(&[0.9, 1.0, 1.0]);
        assert_eq!(first, second);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_tie_goes_to_first_inserted() {
        let mut registry = IdentityRegistry::default();
        registry.add_known("first", vec![0.0, 0.2]).unwrap();
        registry.add_known("second", vec![0.0, -0.2]).unwrap();
        assert_eq!(registry.identify(&[0.0, 0.0]).label(), "first");
    }

    #[test]
    fn test_unmatched_vector_is_registered_once() {
        let mut registry = seeded();
        let far = [5.0, 5.0, 5.0];
        let first = registry.identify(&far);
        assert_eq!(
            first,
            Identification::Unknown {
                registered: Some(IdentityLabel::Unknown(0))
            }
        );
        assert_eq!(registry.len(), 3);

        let second = registry.identify(&far);
        assert_eq!(second.label(), "unknown-0");
        assert_eq!(second.score(), Some(100.0));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_thresholds_are_independent() {
        let mut registry = IdentityRegistry::new(RegistryConfig {
            match_threshold: 0.1,
            duplicate_threshold: 1.0,
        });
        registry.add_known("alice", vec![0.0, 0.0]).unwrap();

        // too far to match, close enough to be a duplicate
        let result = registry.identify(&[0.5, 0.0]);
        assert_eq!(result, Identification::Unknown { registered: None });
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.unknown_counter(), 0);
    }

    #[test]
    fn test_mismatched_dimension_is_ignored() {
        let mut registry = seeded();
        assert_eq!(
            registry.identify(&[9.0, 9.0]),
            Identification::Unknown { registered: None }
        );
        assert!(!registry.register_if_novel(&[9.0, 9.0]));
        assert!(!registry.register_if_novel(&[]));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_non_finite_vector_is_never_registered() {
        let mut registry = IdentityRegistry::default();
        registry.add_known("alice", vec![0.0, 0.0]).unwrap();

        for _ in 0..3 {
            assert!(!registry.register_if_novel(&[f32::NAN, 0.0]));
        }
        assert_eq!(
            registry.identify(&[f32::INFINITY, 0.0]),
            Identification::Unknown { registered: None }
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.unknown_counter(), 0);

        let err = registry.add_known("bob", vec![f32::NAN, 1.0]).unwrap_err();
        assert!(matches!(err, SeedError::NonFinite { .. }));
    }

    #[test]
    fn test_seed_dimension_mismatch() {
        let mut registry = IdentityRegistry::default();
        registry.add_known("alice", vec![0.0, 0.0]).unwrap();
        let err = registry.add_known("bob", vec![0.0]).unwrap_err();
        assert!(matches!(err, SeedError::DimensionMismatch { expected: 2, got: 1, .. }));
    }

    #[test]
    fn test_shared_registry_registers_once() {
        let mut registry = IdentityRegistry::default();
        registry.add_known("alice", vec![0.0, 0.0]).unwrap();
        let shared = SharedIdentityRegistry::new(registry);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                std::thread::spawn(move || shared.identify(&[3.0, 3.0]))
            })
            .collect();
        let registered = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| matches!(r, Identification::Unknown { registered: Some(_) }))
            .count();

        assert_eq!(registered, 1);
        assert_eq!(shared.len(), 2);
    }
}
