//! Urgent-care advisory attached to high-severity results.
//!
//! The locator is a collaborator seam: the built-in [`AdvisoryLocator`] only
//! names the specialty to look for. A deployment with a facility directory
//! plugs in its own implementation.

use serde::Serialize;

use crate::models::{ScanOutcome, ScanType, Severity};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrgentCareOffer {
    pub specialty: String,
    pub message: String,
    pub search_query: String,
}

pub trait UrgentCareLocator: Send + Sync {
    /// Offer for an outcome already known to be high severity. `None` when
    /// the locator has nothing to suggest.
    fn offer(&self, owner_id: &str, scan_type: ScanType, outcome: &ScanOutcome)
        -> Option<UrgentCareOffer>;
}

/// Static advice keyed by domain.
pub struct AdvisoryLocator;

impl UrgentCareLocator for AdvisoryLocator {
    fn offer(
        &self,
        _owner_id: &str,
        scan_type: ScanType,
        outcome: &ScanOutcome,
    ) -> Option<UrgentCareOffer> {
        if outcome.severity != Severity::High {
            return None;
        }
        let specialty = specialty_for(scan_type);
        Some(UrgentCareOffer {
            specialty: specialty.to_string(),
            message: format!(
                "This result suggests prompt medical attention. Find a nearby {} or urgent care clinic.",
                specialty.to_lowercase()
            ),
            search_query: format!("emergency {} near me", specialty.to_lowercase()),
        })
    }
}

pub fn specialty_for(scan_type: ScanType) -> &'static str {
    match scan_type {
        ScanType::Eyes => "Ophthalmologist",
        ScanType::Teeth => "Dentist",
        ScanType::Skin => "Dermatologist",
    }
}

/// Locator that never offers anything.
pub struct NoLocator;

impl UrgentCareLocator for NoLocator {
    fn offer(&self, _: &str, _: ScanType, _: &ScanOutcome) -> Option<UrgentCareOffer> {
        None
    }
}
