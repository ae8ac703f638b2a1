use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{LikeState, Model, MyPageState, ToastKind, ToastMessage};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HospitalRow {
    pub id: String,
    pub name: String,
    pub address: String,
    pub bookmarked_at: String,
    pub distance: String,
    pub is_deleting: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LikePageView {
    Loading,
    Empty,
    Hospitals { rows: Vec<HospitalRow> },
}

impl From<&LikeState> for LikePageView {
    fn from(like: &LikeState) -> Self {
        if like.is_still_loading() {
            return Self::Loading;
        }
        if like.details.is_empty() {
            return Self::Empty;
        }
        let rows = like
            .details
            .iter()
            .map(|d| HospitalRow {
                id: d.id.clone(),
                name: d.name.clone(),
                address: d.address.clone(),
                bookmarked_at: d.bookmarked_at.clone(),
                distance: d.distance_km.clone(),
                is_deleting: like.pending_deletes.contains(&d.id),
            })
            .collect();
        Self::Hospitals { rows }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MyPageView {
    pub user_info: Option<Value>,
    pub nickname: Option<String>,
    pub diseases: Option<Value>,
    pub last_survey: Option<Value>,
}

impl From<&MyPageState> for MyPageView {
    fn from(state: &MyPageState) -> Self {
        Self {
            user_info: state.user_info.clone(),
            nickname: state.nickname.clone(),
            diseases: state.diseases.clone(),
            last_survey: state.last_survey.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastView {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl From<&ToastMessage> for ToastView {
    fn from(t: &ToastMessage) -> Self {
        Self {
            message: t.message.clone(),
            kind: t.kind,
            duration_ms: t.duration_ms,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub like: LikePageView,
    pub my_page: MyPageView,
    pub toast: Option<ToastView>,
    pub last_error: Option<String>,
}

impl From<&Model> for ViewModel {
    fn from(model: &Model) -> Self {
        Self {
            like: LikePageView::from(&model.like),
            my_page: MyPageView::from(&model.my_page),
            toast: model.toast.as_ref().map(ToastView::from),
            last_error: model.like.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmarks::BookmarkRecord;
    use crate::enrich::PlaceDetail;
    use crate::model::LikePhase;

    fn detail(id: &str) -> PlaceDetail {
        PlaceDetail {
            id: id.into(),
            name: format!("Hospital {id}"),
            address: "Seoul".into(),
            bookmarked_at: "2024-01-01".into(),
            distance_km: "2.00 km".into(),
        }
    }

    #[test]
    fn test_loading_until_details_loaded() {
        let mut like = LikeState::default();
        assert_eq!(LikePageView::from(&like), LikePageView::Loading);

        like.phase = LikePhase::DetailsLoading;
        like.details = vec![detail("a")];
        assert_eq!(LikePageView::from(&like), LikePageView::Loading);
    }

    #[test]
    fn test_empty_after_load_without_rows() {
        let mut like = LikeState::default();
        like.complete(Vec::new());
        assert_eq!(LikePageView::from(&like), LikePageView::Empty);
    }

    #[test]
    fn test_rows_mark_pending_deletes() {
        let mut like = LikeState {
            bookmarks: ["a", "b"]
                .into_iter()
                .map(|id| BookmarkRecord {
                    place_id: id.into(),
                    bookmarked_at: "2024-01-01".into(),
                })
                .collect(),
            ..LikeState::default()
        };
        like.complete(vec![detail("a"), detail("b")]);
        like.pending_deletes.insert("b".into());

        let LikePageView::Hospitals { rows } = LikePageView::from(&like) else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].distance, "2.00 km");
        assert!(!rows[0].is_deleting);
        assert!(rows[1].is_deleting);
    }
}
