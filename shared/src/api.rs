//! Remote API client.
//!
//! Every operation performs exactly one request through the `Http`
//! capability and hands the caller an [`ApiResponse`]: the data on a 2xx
//! response, a fixed per-endpoint message on anything else. Transport details
//! are logged here and never leave this module. Toasts and navigation are the
//! app's business, not this module's.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::capabilities::{ApiBase, FileUpload, Http, HttpError, MultipartForm};
use crate::event::Event;

pub mod paths {
    pub const SURVEY: &str = "/api/survey";
    pub const SURVEY_LIST: &str = "/api/survey/list";
    pub const SURVEY_DELETE: &str = "/api/survey/delete";
    pub const CHANGE_PASSWORD: &str = "/api/members/change-password";
    pub const CHANGE_PROFILE_IMAGE: &str = "/api/members/change-profile-image";
    pub const MY_PAGE: &str = "/api/members/my-page";
    pub const CHANGE_NICKNAME: &str = "/api/members/change-nickname";
    pub const VERIFY_EMAIL: &str = "/api/members/verify-email";
}

pub mod messages {
    pub const SURVEY_SAVE_FAILED: &str = "Failed to save the health survey. Please try again.";
    pub const PASSWORD_CHANGE_FAILED: &str = "An error occurred while changing the password.";
    pub const DISEASE_LIST_FAILED: &str = "An error occurred while loading the disease list.";
    pub const DISEASE_DELETE_FAILED: &str = "An error occurred while deleting the disease entry.";
    pub const PROFILE_IMAGE_FAILED: &str = "Failed to set the profile image.";
    pub const USER_INFO_FAILED: &str = "An error occurred while loading member info.";
    pub const NICKNAME_CHANGE_FAILED: &str = "An error occurred while changing the nickname.";
    pub const EMAIL_VERIFICATION_FAILED: &str = "Email verification request failed.";
    pub const BOOKMARKS_FAILED: &str = "An error occurred while loading liked hospitals.";
    pub const BOOKMARK_DELETE_FAILED: &str = "An error occurred while deleting the hospital.";
}

/// Normalised outcome of one backend call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApiResponse<T> {
    Success { data: T },
    Failure { message: String },
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::Success { data }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn map<U, F>(self, f: F) -> ApiResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Success { data } => ApiResponse::Success { data: f(data) },
            Self::Failure { message } => ApiResponse::Failure { message },
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Success { data } => Ok(data),
            Self::Failure { message } => Err(message),
        }
    }
}

/// `{ "data": ... }` wrapper the backend puts around most payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordBody<'a> {
    new_password: &'a str,
    confirm_password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileImagePathBody<'a> {
    image_file: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangeNicknameBody<'a> {
    new_nickname: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct VerifyEmailBody<'a> {
    email: &'a str,
}

pub(crate) fn settle<T>(
    result: crux_http::Result<crux_http::Response<T>>,
    failure: &str,
) -> ApiResponse<T> {
    match result {
        Ok(mut response) if response.status().is_success() => match response.take_body() {
            Some(data) => ApiResponse::success(data),
            None => {
                warn!(failure, "successful response without a body");
                ApiResponse::failure(failure)
            }
        },
        Ok(response) => {
            warn!(status = ?response.status(), failure, "request rejected by backend");
            ApiResponse::failure(failure)
        }
        Err(e) => {
            warn!(error = %e, failure, "request failed");
            ApiResponse::failure(failure)
        }
    }
}

pub(crate) fn settle_empty(
    result: crux_http::Result<crux_http::Response<Vec<u8>>>,
    failure: &str,
) -> ApiResponse<()> {
    match result {
        Ok(response) if response.status().is_success() => ApiResponse::success(()),
        Ok(response) => {
            warn!(status = ?response.status(), failure, "request rejected by backend");
            ApiResponse::failure(failure)
        }
        Err(e) => {
            warn!(error = %e, failure, "request failed");
            ApiResponse::failure(failure)
        }
    }
}

/// Thin typed wrapper over the `Http` capability for one configured backend.
pub struct ApiClient<'a> {
    pub(crate) http: &'a Http<Event>,
    pub(crate) base: ApiBase,
}

impl<'a> ApiClient<'a> {
    pub fn new(http: &'a Http<Event>, base: ApiBase) -> Self {
        Self { http, base }
    }

    pub(crate) fn url(&self, path: &str, segments: &[&str]) -> Result<String, HttpError> {
        self.base.endpoint(path, segments)
    }

    pub(crate) fn send_json<T, B, F>(
        &self,
        builder: crux_http::RequestBuilder<Event>,
        body: &B,
        failure: &'static str,
        callback: F,
    ) -> Result<(), HttpError>
    where
        T: DeserializeOwned + Send + 'static,
        B: Serialize,
        F: FnOnce(ApiResponse<T>) -> Event + Send + 'static,
    {
        builder
            .body_json(body)
            .map_err(|e| HttpError::Encode {
                reason: e.to_string(),
            })?
            .expect_json::<T>()
            .send(move |result| callback(settle(result, failure)));
        Ok(())
    }

    pub(crate) fn send_json_empty<B, F>(
        &self,
        builder: crux_http::RequestBuilder<Event>,
        body: &B,
        failure: &'static str,
        callback: F,
    ) -> Result<(), HttpError>
    where
        B: Serialize,
        F: FnOnce(ApiResponse<()>) -> Event + Send + 'static,
    {
        builder
            .body_json(body)
            .map_err(|e| HttpError::Encode {
                reason: e.to_string(),
            })?
            .send(move |result| callback(settle_empty(result, failure)));
        Ok(())
    }

    pub fn submit_survey<F>(&self, answers: &Value, callback: F) -> Result<(), HttpError>
    where
        F: FnOnce(ApiResponse<Value>) -> Event + Send + 'static,
    {
        let url = self.url(paths::SURVEY, &[])?;
        debug!(%url, "submitting survey");
        self.send_json(self.http.post(url), answers, messages::SURVEY_SAVE_FAILED, callback)
    }

    pub fn change_password<F>(
        &self,
        new_password: &str,
        confirm_password: &str,
        callback: F,
    ) -> Result<(), HttpError>
    where
        F: FnOnce(ApiResponse<()>) -> Event + Send + 'static,
    {
        let url = self.url(paths::CHANGE_PASSWORD, &[])?;
        let body = ChangePasswordBody {
            new_password,
            confirm_password,
        };
        self.send_json_empty(
            self.http.patch(url),
            &body,
            messages::PASSWORD_CHANGE_FAILED,
            callback,
        )
    }

    pub fn fetch_disease_list<F>(&self, callback: F) -> Result<(), HttpError>
    where
        F: FnOnce(ApiResponse<Value>) -> Event + Send + 'static,
    {
        let url = self.url(paths::SURVEY_LIST, &[])?;
        self.http
            .get(url)
            .expect_json::<Value>()
            .send(move |result| callback(settle(result, messages::DISEASE_LIST_FAILED)));
        Ok(())
    }

    pub fn delete_survey<F>(&self, survey_id: u64, callback: F) -> Result<(), HttpError>
    where
        F: FnOnce(ApiResponse<()>) -> Event + Send + 'static,
    {
        let id = survey_id.to_string();
        let url = self.url(paths::SURVEY_DELETE, &[&id])?;
        self.http
            .delete(url)
            .send(move |result| callback(settle_empty(result, messages::DISEASE_DELETE_FAILED)));
        Ok(())
    }

    pub fn change_profile_image<F>(&self, image_path: &str, callback: F) -> Result<(), HttpError>
    where
        F: FnOnce(ApiResponse<()>) -> Event + Send + 'static,
    {
        let url = self.url(paths::CHANGE_PROFILE_IMAGE, &[])?;
        let body = ProfileImagePathBody {
            image_file: image_path,
        };
        self.send_json_empty(
            self.http.post(url),
            &body,
            messages::PROFILE_IMAGE_FAILED,
            callback,
        )
    }

    pub fn upload_profile_image<F>(&self, file: &FileUpload, callback: F) -> Result<(), HttpError>
    where
        F: FnOnce(ApiResponse<()>) -> Event + Send + 'static,
    {
        let url = self.url(paths::CHANGE_PROFILE_IMAGE, &[])?;
        let (content_type, body) = MultipartForm::new().file("imageFile", file)?.finish();
        debug!(%url, size = body.len(), "uploading profile image");
        // Body first: setting it resets the content type.
        self.http
            .post(url)
            .body_bytes(body)
            .header("Content-Type", content_type.header_value().as_str())
            .send(move |result| callback(settle_empty(result, messages::PROFILE_IMAGE_FAILED)));
        Ok(())
    }

    pub fn fetch_user_info<F>(&self, callback: F) -> Result<(), HttpError>
    where
        F: FnOnce(ApiResponse<Value>) -> Event + Send + 'static,
    {
        let url = self.url(paths::MY_PAGE, &[])?;
        self.http
            .get(url)
            .expect_json::<Value>()
            .send(move |result| callback(settle(result, messages::USER_INFO_FAILED)));
        Ok(())
    }

    pub fn change_nickname<F>(&self, new_nickname: &str, callback: F) -> Result<(), HttpError>
    where
        F: FnOnce(ApiResponse<()>) -> Event + Send + 'static,
    {
        let url = self.url(paths::CHANGE_NICKNAME, &[])?;
        let body = ChangeNicknameBody { new_nickname };
        self.send_json_empty(
            self.http.patch(url),
            &body,
            messages::NICKNAME_CHANGE_FAILED,
            callback,
        )
    }

    /// On success the payload is the server's human-readable message.
    pub fn send_email_verification<F>(&self, email: &str, callback: F) -> Result<(), HttpError>
    where
        F: FnOnce(ApiResponse<String>) -> Event + Send + 'static,
    {
        let url = self.url(paths::VERIFY_EMAIL, &[])?;
        self.send_json(
            self.http.post(url),
            &VerifyEmailBody { email },
            messages::EMAIL_VERIFICATION_FAILED,
            move |response: ApiResponse<Envelope<String>>| callback(response.map(|e| e.data)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_helpers() {
        let ok: ApiResponse<u32> = ApiResponse::success(3);
        assert_eq!(ok.clone().map(|n| n * 2), ApiResponse::success(6));
        assert_eq!(ok.into_result(), Ok(3));

        let failed: ApiResponse<u32> = ApiResponse::failure(messages::USER_INFO_FAILED);
        assert_eq!(
            failed.map(|n| n + 1).into_result(),
            Err(messages::USER_INFO_FAILED.to_string())
        );
    }

    #[test]
    fn test_response_wire_shape() {
        let ok: ApiResponse<Vec<u8>> = ApiResponse::success(vec![1]);
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({ "status": "success", "data": [1] })
        );
        let failed: ApiResponse<()> = ApiResponse::failure("nope");
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            serde_json::json!({ "status": "failure", "message": "nope" })
        );
    }

    #[test]
    fn test_request_bodies_use_backend_field_names() {
        let password = serde_json::to_value(ChangePasswordBody {
            new_password: "pw1",
            confirm_password: "pw1",
        })
        .unwrap();
        assert_eq!(
            password,
            serde_json::json!({ "newPassword": "pw1", "confirmPassword": "pw1" })
        );

        let image = serde_json::to_value(ProfileImagePathBody { image_file: "/img/a.png" }).unwrap();
        assert_eq!(image, serde_json::json!({ "imageFile": "/img/a.png" }));

        let nickname = serde_json::to_value(ChangeNicknameBody { new_nickname: "doc" }).unwrap();
        assert_eq!(nickname, serde_json::json!({ "newNickname": "doc" }));
    }

    #[test]
    fn test_envelope_unwraps_verification_message() {
        let envelope: Envelope<String> =
            serde_json::from_str(r#"{ "data": "Verification mail sent" }"#).unwrap();
        assert_eq!(envelope.data, "Verification mail sent");
    }
}
