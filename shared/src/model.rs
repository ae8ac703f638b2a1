use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bookmarks::BookmarkRecord;
use crate::capabilities::SdkGuard;
use crate::config::AppConfig;
use crate::enrich::{EnrichmentBatch, PlaceDetail};
use crate::geo::ValidatedCoordinate;

pub const TOAST_DURATION_MS: u64 = 3_000;
pub const ERROR_TOAST_DURATION_MS: u64 = 5_000;

/// Liked-hospitals page lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LikePhase {
    #[default]
    Idle,
    BookmarksLoading,
    BookmarksLoaded,
    DetailsLoading,
    DetailsLoaded,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LikeState {
    pub bookmarks: Vec<BookmarkRecord>,
    pub details: Vec<PlaceDetail>,
    pub phase: LikePhase,
    /// Bumped on every page open; results tagged with an older value are stale.
    pub generation: u64,
    pub origin: Option<ValidatedCoordinate>,
    pub batch: Option<EnrichmentBatch>,
    pub awaiting_sdk: bool,
    pub pending_deletes: HashSet<String>,
    pub last_error: Option<String>,
}

impl LikeState {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(
            self.phase,
            LikePhase::BookmarksLoading | LikePhase::DetailsLoading
        )
    }

    #[must_use]
    pub fn bookmarks_loaded(&self) -> bool {
        self.phase >= LikePhase::BookmarksLoaded
    }

    #[must_use]
    pub fn details_loaded(&self) -> bool {
        self.phase == LikePhase::DetailsLoaded
    }

    /// The page shows its loading indicator while this holds.
    #[must_use]
    pub fn is_still_loading(&self) -> bool {
        self.is_loading() || !self.bookmarks_loaded() || !self.details_loaded()
    }

    /// Starts a fresh load and returns its generation.
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.phase = LikePhase::BookmarksLoading;
        self.details.clear();
        self.origin = None;
        self.batch = None;
        self.awaiting_sdk = false;
        self.last_error = None;
        self.generation
    }

    /// Ends enrichment with whatever rows made it through. Rows whose
    /// bookmark was deleted while the batch was in flight are left out.
    pub fn complete(&mut self, mut details: Vec<PlaceDetail>) {
        details.retain(|d| self.bookmarks.iter().any(|b| b.place_id == d.id));
        self.details = details;
        self.batch = None;
        self.awaiting_sdk = false;
        self.phase = LikePhase::DetailsLoaded;
    }

    /// Drops the row and bookmark for `place_id`; returns whether a row went.
    pub fn remove(&mut self, place_id: &str) -> bool {
        let before = self.details.len();
        self.details.retain(|d| d.id != place_id);
        self.bookmarks.retain(|b| b.place_id != place_id);
        self.details.len() != before
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MyPageState {
    pub user_info: Option<Value>,
    pub nickname: Option<String>,
    pub diseases: Option<Value>,
    pub last_survey: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

impl ToastKind {
    #[must_use]
    pub const fn duration_ms(self) -> u64 {
        match self {
            Self::Info | Self::Success => TOAST_DURATION_MS,
            Self::Error => ERROR_TOAST_DURATION_MS,
        }
    }
}

/// Non-blocking notification for the shell to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl ToastMessage {
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            duration_ms: kind.duration_ms(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: AppConfig,
    pub like: LikeState,
    pub my_page: MyPageState,
    /// One per core; survives page re-opens.
    pub sdk: SdkGuard,
    pub toast: Option<ToastMessage>,
}

impl Model {
    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.toast = Some(ToastMessage::new(message, kind));
    }

    pub fn clear_toast(&mut self) {
        self.toast = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmarked(ids: &[&str]) -> LikeState {
        LikeState {
            bookmarks: ids
                .iter()
                .map(|id| BookmarkRecord {
                    place_id: (*id).into(),
                    bookmarked_at: "2024-01-01".into(),
                })
                .collect(),
            ..LikeState::default()
        }
    }

    fn detail(id: &str) -> PlaceDetail {
        PlaceDetail {
            id: id.into(),
            name: id.into(),
            address: String::new(),
            bookmarked_at: "2024-01-01".into(),
            distance_km: "1.00 km".into(),
        }
    }

    #[test]
    fn test_still_loading_until_details_loaded() {
        let mut like = LikeState::default();
        assert!(like.is_still_loading());

        for phase in [
            LikePhase::BookmarksLoading,
            LikePhase::BookmarksLoaded,
            LikePhase::DetailsLoading,
        ] {
            like.phase = phase;
            assert!(like.is_still_loading(), "{phase:?}");
        }

        like.phase = LikePhase::DetailsLoaded;
        assert!(like.bookmarks_loaded());
        assert!(like.details_loaded());
        assert!(!like.is_loading());
        assert!(!like.is_still_loading());
    }

    #[test]
    fn test_begin_bumps_generation_and_resets() {
        let mut like = LikeState::default();
        like.complete(vec![detail("a")]);
        like.last_error = Some("boom".into());

        assert_eq!(like.begin(), 1);
        assert_eq!(like.begin(), 2);
        assert!(like.details.is_empty());
        assert_eq!(like.last_error, None);
        assert_eq!(like.phase, LikePhase::BookmarksLoading);
    }

    #[test]
    fn test_remove_only_matching_row() {
        let mut like = bookmarked(&["a", "b", "c"]);
        like.complete(vec![detail("a"), detail("b"), detail("c")]);

        assert!(like.remove("b"));
        let ids: Vec<_> = like.details.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(like.bookmarks.len(), 2);
        assert!(!like.remove("zzz"));
        assert_eq!(like.details.len(), 2);
    }

    #[test]
    fn test_complete_skips_rows_deleted_in_flight() {
        let mut like = bookmarked(&["a", "b"]);
        like.phase = LikePhase::DetailsLoading;
        assert!(!like.remove("a"));
        assert_eq!(like.bookmarks.len(), 1);

        like.complete(vec![detail("a"), detail("b")]);

        let ids: Vec<_> = like.details.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
        assert!(like.details_loaded());
    }

    #[test]
    fn test_toast_durations() {
        assert_eq!(ToastMessage::new("ok", ToastKind::Success).duration_ms, TOAST_DURATION_MS);
        assert_eq!(
            ToastMessage::new("bad", ToastKind::Error).duration_ms,
            ERROR_TOAST_DURATION_MS
        );
    }
}
