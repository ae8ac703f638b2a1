//! Place-detail enrichment: turns raw bookmarks plus per-place lookup results
//! into display rows with a distance from the user.
//!
//! The capability round trips live in the app; this module owns the batch
//! bookkeeping for the fan-out/join and the aggregation rules.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::bookmarks::BookmarkRecord;
use crate::capabilities::{PlaceLookupResult, PlaceRecord};
use crate::geo::{format_km, ValidatedCoordinate, DISTANCE_UNAVAILABLE};

/// What to do when a single lookup comes back `NotFound` or `Invalid`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemFailurePolicy {
    /// Skip the item, keep the rest of the batch.
    #[default]
    Drop,
    /// Fail the whole batch on the first failed item.
    AbortAll,
}

/// What to do when a found place has no usable distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistancePolicy {
    #[default]
    Drop,
    /// Keep the row with [`DISTANCE_UNAVAILABLE`].
    Mark,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentPolicy {
    #[serde(default)]
    pub on_item_failure: ItemFailurePolicy,
    #[serde(default)]
    pub on_distance_unavailable: DistancePolicy,
}

/// One enriched bookmark, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceDetail {
    pub id: String,
    pub name: String,
    pub address: String,
    pub bookmarked_at: String,
    pub distance_km: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnrichError {
    #[error("place lookup failed for {place_id}")]
    LookupFailed { place_id: String },
}

/// Bookmarks that are worth a lookup: non-empty id, first occurrence only.
#[must_use]
pub fn eligible(bookmarks: &[BookmarkRecord]) -> Vec<BookmarkRecord> {
    let mut seen = HashSet::new();
    bookmarks
        .iter()
        .filter(|b| !b.place_id.trim().is_empty())
        .filter(|b| seen.insert(b.place_id.clone()))
        .cloned()
        .collect()
}

/// In-flight fan-out: one slot per dispatched lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentBatch {
    generation: u64,
    origin: ValidatedCoordinate,
    jobs: Vec<BookmarkRecord>,
    slots: Vec<Option<PlaceLookupResult>>,
}

impl EnrichmentBatch {
    #[must_use]
    pub fn new(generation: u64, origin: ValidatedCoordinate, jobs: Vec<BookmarkRecord>) -> Self {
        let slots = vec![None; jobs.len()];
        Self {
            generation,
            origin,
            jobs,
            slots,
        }
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Stores the result for `slot`. Unknown slots and repeated deliveries are
    /// ignored; returns whether the result was accepted.
    pub fn fill(&mut self, slot: usize, result: PlaceLookupResult) -> bool {
        match self.slots.get_mut(slot) {
            Some(entry) if entry.is_none() => {
                *entry = Some(result);
                true
            }
            Some(_) => {
                debug!(slot, "duplicate place lookup result ignored");
                false
            }
            None => {
                warn!(slot, "place lookup result for unknown slot");
                false
            }
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Joins the batch. Unfilled slots count as `Invalid`.
    pub fn finish(self, policy: EnrichmentPolicy) -> Result<Vec<PlaceDetail>, EnrichError> {
        let outcomes = self
            .slots
            .into_iter()
            .map(|slot| slot.unwrap_or(PlaceLookupResult::Invalid));
        aggregate(self.origin, self.jobs.iter().zip(outcomes), policy)
    }
}

/// Builds display rows from `(bookmark, lookup result)` pairs.
pub fn aggregate<'a, I>(
    origin: ValidatedCoordinate,
    outcomes: I,
    policy: EnrichmentPolicy,
) -> Result<Vec<PlaceDetail>, EnrichError>
where
    I: IntoIterator<Item = (&'a BookmarkRecord, PlaceLookupResult)>,
{
    let mut details: Vec<PlaceDetail> = Vec::new();
    let mut seen = HashSet::new();

    for (bookmark, outcome) in outcomes {
        let place = match outcome {
            PlaceLookupResult::Found(place) => place,
            PlaceLookupResult::NotFound | PlaceLookupResult::Invalid => {
                match policy.on_item_failure {
                    ItemFailurePolicy::Drop => {
                        warn!(place_id = %bookmark.place_id, "place lookup failed, dropping");
                        continue;
                    }
                    ItemFailurePolicy::AbortAll => {
                        return Err(EnrichError::LookupFailed {
                            place_id: bookmark.place_id.clone(),
                        });
                    }
                }
            }
        };

        let distance_km = match distance_text(origin, &place) {
            Some(text) => text,
            None => match policy.on_distance_unavailable {
                DistancePolicy::Drop => {
                    debug!(place_id = %place.place_id, "distance unavailable, dropping");
                    continue;
                }
                DistancePolicy::Mark => DISTANCE_UNAVAILABLE.to_string(),
            },
        };

        // Rows are keyed by the stored bookmark id, whatever id the service echoes.
        let id = bookmark.place_id.clone();
        if place.place_id != id {
            debug!(%id, echoed = %place.place_id, "lookup answered with a different place id");
        }

        if !seen.insert(id.clone()) {
            debug!(%id, "duplicate place id in lookup results");
            continue;
        }

        details.push(PlaceDetail {
            id,
            name: place.name,
            address: place.formatted_address,
            bookmarked_at: bookmark.bookmarked_at.clone(),
            distance_km,
        });
    }

    Ok(details)
}

fn distance_text(origin: ValidatedCoordinate, place: &PlaceRecord) -> Option<String> {
    let target = place.location?.validate().ok()?;
    format_km(origin.distance_to(target))
}
