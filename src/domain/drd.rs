use std::{
    cmp::Ordering,
    collections::BTreeSet,
    hash::{Hash, Hasher},
};

use crate::domain::Phase;

/// A deliverable document requirement definition (DRD).
///
/// Identity is the DRD `number`: two definitions with the same number are the
/// same DRD, whatever their other fields say.
#[derive(Debug, Clone)]
pub struct Drd {
    /// Stable identifier, e.g. `DRD-7`.
    pub number: String,
    /// Title of the deliverable document.
    pub title: String,
    /// What has to be done with the document (e.g. `delivery`, `review`).
    pub action: String,
    /// When the document is due (usually a review milestone such as `PDR`).
    pub delivery_date: String,
    /// The lifecycle phases the document is delivered in.
    pub phases: BTreeSet<Phase>,
}

impl Drd {
    /// Creates a DRD that is not associated with any phase.
    #[must_use]
    pub fn new(number: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            title: title.into(),
            action: String::new(),
            delivery_date: String::new(),
            phases: BTreeSet::new(),
        }
    }

    /// Sets the phases the DRD is associated with.
    #[must_use]
    pub fn with_phases(mut self, phases: impl IntoIterator<Item = Phase>) -> Self {
        self.phases = phases.into_iter().collect();
        self
    }

    /// Sets the action and delivery date.
    #[must_use]
    pub fn with_delivery(mut self, action: impl Into<String>, delivery_date: impl Into<String>) -> Self {
        self.action = action.into();
        self.delivery_date = delivery_date.into();
        self
    }

    /// Whether the DRD is associated with at least one of the given phases.
    #[must_use]
    pub fn applies_to(&self, phases: &BTreeSet<Phase>) -> bool {
        !self.phases.is_disjoint(phases)
    }
}

impl PartialEq for Drd {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
    }
}

impl Eq for Drd {}

impl PartialOrd for Drd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Drd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number.cmp(&other.number)
    }
}

impl Hash for Drd {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.number.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_the_number() {
        let a = Drd::new("DRD-1", "Software development plan");
        let b = Drd::new("DRD-1", "Renamed plan").with_phases([Phase::A]);
        assert_eq!(a, b);
        assert_ne!(a, Drd::new("DRD-2", "Software development plan"));
    }

    #[test]
    fn applies_to_requires_phase_overlap() {
        let drd = Drd::new("DRD-7", "Test report").with_phases([Phase::B]);

        assert!(!drd.applies_to(&BTreeSet::from([Phase::A])));
        assert!(drd.applies_to(&BTreeSet::from([Phase::A, Phase::B])));
        assert!(!drd.applies_to(&BTreeSet::new()));
    }

    #[test]
    fn drd_without_phases_never_applies() {
        let drd = Drd::new("DRD-9", "Orphan");
        assert!(!drd.applies_to(&Phase::ALL.into_iter().collect()));
    }
}
