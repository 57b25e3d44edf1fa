//! Reconciliation of downloaded readings against stored quote points.
//!
//! Stored data is authoritative once valid: a valid point is never
//! overwritten, an invalid point may only be promoted by a valid reading,
//! and an unseen `(granularity, stamp)` becomes a new point stamped with
//! the owning company. The engine never deletes points.

use std::collections::{HashMap, HashSet};

use crate::domain::{CompanyId, QuoteId, QuoteKey, QuotePoint, QuoteSample};

/// Writes produced by one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileOutcome {
    /// Genuinely new points, ascending by stamp.
    pub to_add: Vec<QuotePoint>,
    /// Stored-but-invalid points promoted by a valid reading. Each carries
    /// the stored point's identity with the downloaded OHLCV fields and
    /// `is_valid` flipped on.
    pub to_update: Vec<QuotePoint>,
}

impl ReconcileOutcome {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty()
    }
}

/// Merge a downloaded batch into one company's stored series.
pub fn reconcile(
    company_id: CompanyId,
    existing: &[QuotePoint],
    downloaded: Vec<QuoteSample>,
) -> ReconcileOutcome {
    let mut valid_keys: HashSet<QuoteKey> = HashSet::new();
    let mut invalid_keys: HashMap<QuoteKey, QuoteId> = HashMap::new();
    for point in existing {
        if point.is_valid {
            valid_keys.insert(point.key());
        } else {
            invalid_keys.insert(point.key(), point.id);
        }
    }

    let mut outcome = ReconcileOutcome::default();
    let mut seen: HashSet<QuoteKey> = HashSet::new();
    for sample in downloaded {
        let key = sample.key();
        if valid_keys.contains(&key) || !seen.insert(key) {
            continue;
        }

        match invalid_keys.get(&key) {
            Some(&stored_id) if sample.is_valid => {
                let mut promoted = QuotePoint::from_sample(company_id, sample);
                promoted.id = stored_id;
                outcome.to_update.push(promoted);
            }
            // A still-invalid reading for an already-invalid stamp carries
            // nothing new; keep whatever partial data is stored.
            Some(_) => {}
            None => outcome.to_add.push(QuotePoint::from_sample(company_id, sample)),
        }
    }

    outcome.to_add.sort_by_key(QuotePoint::key);
    outcome
}
