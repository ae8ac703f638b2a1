use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ApiResponse;
use crate::bookmarks::BookmarkRecord;
use crate::capabilities::{FileUpload, GeolocationResult, PlaceLookupResult, PlacesOutput};
use crate::config::AppConfig;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    Noop,

    Configure(AppConfig),
    ToastDismissed,

    // Liked hospitals
    LikePageOpened,
    #[serde(skip)]
    BookmarksLoaded {
        generation: u64,
        response: ApiResponse<Vec<BookmarkRecord>>,
    },
    #[serde(skip)]
    PositionResolved {
        generation: u64,
        result: GeolocationResult,
    },
    #[serde(skip)]
    SdkLoaded(PlacesOutput),
    #[serde(skip)]
    PlaceResolved {
        generation: u64,
        slot: usize,
        result: PlaceLookupResult,
    },
    DeleteHospitalRequested {
        place_id: String,
    },
    #[serde(skip)]
    HospitalDeleted {
        place_id: String,
        response: ApiResponse<()>,
    },

    // Health survey
    SurveySubmitted {
        answers: Value,
    },
    #[serde(skip)]
    SurveySaved(ApiResponse<Value>),

    // Account
    PasswordChangeRequested {
        new_password: String,
        confirm_password: String,
    },
    #[serde(skip)]
    PasswordChanged(ApiResponse<()>),
    DiseaseListRequested,
    #[serde(skip)]
    DiseaseListLoaded(ApiResponse<Value>),
    DiseaseDeleteRequested {
        survey_id: u64,
    },
    #[serde(skip)]
    DiseaseDeleted {
        survey_id: u64,
        response: ApiResponse<()>,
    },
    ProfileImageChangeRequested {
        image_path: String,
    },
    ProfileImageUploadRequested(FileUpload),
    #[serde(skip)]
    ProfileImageChanged(ApiResponse<()>),
    UserInfoRequested,
    #[serde(skip)]
    UserInfoLoaded(ApiResponse<Value>),
    NicknameChangeRequested {
        nickname: String,
    },
    #[serde(skip)]
    NicknameChanged {
        nickname: String,
        response: ApiResponse<()>,
    },
    EmailVerificationRequested {
        email: String,
    },
    #[serde(skip)]
    EmailVerificationSent(ApiResponse<String>),
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configure(_) => "configure",
            Self::ToastDismissed => "toast_dismissed",
            Self::LikePageOpened => "like_page_opened",
            Self::BookmarksLoaded { .. } => "bookmarks_loaded",
            Self::PositionResolved { .. } => "position_resolved",
            Self::SdkLoaded(_) => "sdk_loaded",
            Self::PlaceResolved { .. } => "place_resolved",
            Self::DeleteHospitalRequested { .. } => "delete_hospital_requested",
            Self::HospitalDeleted { .. } => "hospital_deleted",
            Self::SurveySubmitted { .. } => "survey_submitted",
            Self::SurveySaved(_) => "survey_saved",
            Self::PasswordChangeRequested { .. } => "password_change_requested",
            Self::PasswordChanged(_) => "password_changed",
            Self::DiseaseListRequested => "disease_list_requested",
            Self::DiseaseListLoaded(_) => "disease_list_loaded",
            Self::DiseaseDeleteRequested { .. } => "disease_delete_requested",
            Self::DiseaseDeleted { .. } => "disease_deleted",
            Self::ProfileImageChangeRequested { .. } => "profile_image_change_requested",
            Self::ProfileImageUploadRequested(_) => "profile_image_upload_requested",
            Self::ProfileImageChanged(_) => "profile_image_changed",
            Self::UserInfoRequested => "user_info_requested",
            Self::UserInfoLoaded(_) => "user_info_loaded",
            Self::NicknameChangeRequested { .. } => "nickname_change_requested",
            Self::NicknameChanged { .. } => "nickname_changed",
            Self::EmailVerificationRequested { .. } => "email_verification_requested",
            Self::EmailVerificationSent(_) => "email_verification_sent",
        }
    }

    /// Events the shell sends on behalf of the user, as opposed to
    /// capability callbacks.
    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::LikePageOpened
                | Self::DeleteHospitalRequested { .. }
                | Self::SurveySubmitted { .. }
                | Self::PasswordChangeRequested { .. }
                | Self::DiseaseListRequested
                | Self::DiseaseDeleteRequested { .. }
                | Self::ProfileImageChangeRequested { .. }
                | Self::ProfileImageUploadRequested(_)
                | Self::UserInfoRequested
                | Self::NicknameChangeRequested { .. }
                | Self::EmailVerificationRequested { .. }
                | Self::ToastDismissed
        )
    }
}

// Passwords must never reach the logs.
pub(crate) fn redacted(event: &Event) -> String {
    match event {
        Event::PasswordChangeRequested { .. } => "PasswordChangeRequested { .. }".to_string(),
        other => format!("{other:?}"),
    }
}
