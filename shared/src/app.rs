use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::api::{messages, ApiClient, ApiResponse};
use crate::capabilities::{Capabilities, EnsureOutcome, HttpError, PlacesOutput};
use crate::enrich::{eligible, EnrichmentBatch};
use crate::event::{redacted, Event};
use crate::model::{LikePhase, Model, ToastKind};
use crate::view::ViewModel;

pub mod notices {
    pub const SURVEY_SAVED: &str = "Your health survey has been saved.";
    pub const PASSWORD_CHANGED: &str = "Your password has been changed.";
    pub const PROFILE_IMAGE_CHANGED: &str = "Your profile image has been updated.";
    pub const NICKNAME_CHANGED: &str = "Your nickname has been changed.";
    pub const HOSPITAL_DETAILS_FAILED: &str = "Could not load details for your liked hospitals.";
}

#[derive(Default)]
pub struct App;

impl App {
    /// Builds and sends one backend request. When the request cannot be built
    /// (bad base URL, unencodable body) `fallback` is processed instead, so
    /// every request event is answered exactly once.
    fn dispatch<F>(&self, model: &mut Model, caps: &Capabilities, fallback: Event, request: F)
    where
        F: FnOnce(&ApiClient<'_>) -> Result<(), HttpError>,
    {
        let sent = model
            .config
            .api_base()
            .map_err(|e| e.to_string())
            .and_then(|base| request(&ApiClient::new(&caps.http, base)).map_err(|e| e.to_string()));

        if let Err(error) = sent {
            warn!(%error, fallback = fallback.name(), "request could not be built");
            crux_core::App::update(self, fallback, model, caps);
        }
    }

    fn open_like_page(&self, model: &mut Model, caps: &Capabilities) {
        let generation = model.like.begin();
        let path = model.config.bookmarks_path.clone();
        info!(generation, "loading liked hospitals");

        let fallback = Event::BookmarksLoaded {
            generation,
            response: ApiResponse::failure(messages::BOOKMARKS_FAILED),
        };
        self.dispatch(model, caps, fallback, move |api| {
            api.fetch_bookmarks(&path, move |response| Event::BookmarksLoaded {
                generation,
                response,
            })
        });
    }

    fn ensure_sdk(model: &mut Model, caps: &Capabilities) {
        match model.sdk.ensure() {
            EnsureOutcome::Ready => Self::dispatch_lookups(model, caps),
            EnsureOutcome::InFlight => {
                debug!("maps SDK load already pending");
                model.like.awaiting_sdk = true;
            }
            EnsureOutcome::StartLoad => match model.config.places_script() {
                Ok(script_url) => {
                    info!(attempt = model.sdk.load_requests(), "loading maps SDK");
                    model.like.awaiting_sdk = true;
                    caps.places.load_sdk(script_url, Event::SdkLoaded);
                }
                Err(error) => {
                    warn!(%error, "maps SDK cannot be loaded, skipping enrichment");
                    model.sdk.mark_failed();
                    model.like.complete(Vec::new());
                }
            },
        }
    }

    /// Fans out one lookup per eligible bookmark, all in this update.
    fn dispatch_lookups(model: &mut Model, caps: &Capabilities) {
        let Some(origin) = model.like.origin else {
            warn!("place lookups requested without a position");
            model.like.complete(Vec::new());
            return;
        };

        let generation = model.like.generation;
        let jobs = eligible(&model.like.bookmarks);
        if jobs.is_empty() {
            model.like.complete(Vec::new());
            return;
        }

        for (slot, job) in jobs.iter().enumerate() {
            caps.places.details(job.place_id.clone(), move |result| {
                Event::PlaceResolved {
                    generation,
                    slot,
                    result,
                }
            });
        }
        debug!(generation, count = jobs.len(), "place lookups dispatched");
        model.like.batch = Some(EnrichmentBatch::new(generation, origin, jobs));
    }

    fn sdk_unavailable(model: &mut Model, reason: &str) {
        model.sdk.mark_failed();
        warn!(reason, "maps SDK failed to load");
        if model.like.awaiting_sdk {
            model.like.complete(Vec::new());
        }
    }
}

/// Drops the entry with `survey_id` from a disease list payload, which is
/// either an array or `{ "data": [...] }`.
fn remove_survey(list: &mut Value, survey_id: u64) -> bool {
    let entries = match list {
        Value::Array(entries) => entries,
        Value::Object(map) => match map.get_mut("data") {
            Some(Value::Array(entries)) => entries,
            _ => return false,
        },
        _ => return false,
    };
    let before = entries.len();
    entries.retain(|entry| entry.get("surveyId").and_then(Value::as_u64) != Some(survey_id));
    entries.len() != before
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(
            event = event.name(),
            user_initiated = event.is_user_initiated(),
            "update"
        );
        trace!(event = %redacted(&event));

        match event {
            Event::Noop => {}

            Event::Configure(config) => {
                if let Err(error) = config.validate() {
                    warn!(%error, "configuration incomplete");
                }
                model.config = config;
            }

            Event::ToastDismissed => {
                model.clear_toast();
                caps.render.render();
            }

            Event::LikePageOpened => {
                self.open_like_page(model, caps);
                caps.render.render();
            }

            Event::BookmarksLoaded {
                generation,
                response,
            } => {
                if generation != model.like.generation {
                    debug!(generation, "stale bookmark list ignored");
                    return;
                }

                model.like.bookmarks = response.into_result().unwrap_or_else(|message| {
                    warn!(%message, "bookmark fetch failed, showing empty list");
                    Vec::new()
                });
                model.like.phase = LikePhase::BookmarksLoaded;

                if eligible(&model.like.bookmarks).is_empty() {
                    info!("no liked hospitals");
                    model.like.complete(Vec::new());
                } else {
                    model.like.phase = LikePhase::DetailsLoading;
                    caps.geolocation
                        .current_position(move |result| Event::PositionResolved { generation, result });
                }
                caps.render.render();
            }

            Event::PositionResolved { generation, result } => {
                if generation != model.like.generation
                    || model.like.phase != LikePhase::DetailsLoading
                {
                    debug!(generation, "stale position ignored");
                    return;
                }

                let origin = result
                    .map_err(|e| e.to_string())
                    .and_then(|position| position.lat_lon().validate().map_err(|e| e.to_string()));
                match origin {
                    Ok(origin) => {
                        model.like.origin = Some(origin);
                        Self::ensure_sdk(model, caps);
                    }
                    Err(error) => {
                        warn!(%error, "no usable position, skipping enrichment");
                        model.like.complete(Vec::new());
                    }
                }
                caps.render.render();
            }

            Event::SdkLoaded(output) => {
                match output {
                    PlacesOutput::SdkReady => {
                        info!("maps SDK ready");
                        model.sdk.mark_ready();
                        if model.like.awaiting_sdk {
                            model.like.awaiting_sdk = false;
                            Self::dispatch_lookups(model, caps);
                        }
                    }
                    PlacesOutput::SdkFailed { reason } => Self::sdk_unavailable(model, &reason),
                    PlacesOutput::Details(_) => {
                        Self::sdk_unavailable(model, "unexpected lookup result for SDK load");
                    }
                }
                caps.render.render();
            }

            Event::PlaceResolved {
                generation,
                slot,
                result,
            } => {
                let Some(batch) = model
                    .like
                    .batch
                    .as_mut()
                    .filter(|batch| batch.generation() == generation)
                else {
                    debug!(generation, slot, "stale place lookup ignored");
                    return;
                };

                if !batch.fill(slot, result) || !batch.is_complete() {
                    return;
                }

                let Some(batch) = model.like.batch.take() else {
                    return;
                };
                match batch.finish(model.config.enrichment) {
                    Ok(details) => {
                        info!(count = details.len(), "liked hospitals loaded");
                        model.like.complete(details);
                    }
                    Err(error) => {
                        warn!(%error, "hospital detail batch aborted");
                        model.like.complete(Vec::new());
                        model.show_toast(notices::HOSPITAL_DETAILS_FAILED, ToastKind::Error);
                    }
                }
                caps.render.render();
            }

            Event::DeleteHospitalRequested { place_id } => {
                if place_id.trim().is_empty() {
                    warn!("delete requested without a place id");
                    return;
                }
                if !model.like.pending_deletes.insert(place_id.clone()) {
                    debug!(%place_id, "delete already in flight");
                    return;
                }

                let path = model.config.bookmarks_path.clone();
                let fallback = Event::HospitalDeleted {
                    place_id: place_id.clone(),
                    response: ApiResponse::failure(messages::BOOKMARK_DELETE_FAILED),
                };
                self.dispatch(model, caps, fallback, move |api| {
                    let id = place_id.clone();
                    api.delete_bookmark(&path, &place_id, move |response| Event::HospitalDeleted {
                        place_id: id,
                        response,
                    })
                });
                caps.render.render();
            }

            Event::HospitalDeleted { place_id, response } => {
                model.like.pending_deletes.remove(&place_id);
                match response {
                    ApiResponse::Success { .. } => {
                        info!(%place_id, "hospital removed from likes");
                        model.like.remove(&place_id);
                        model.like.last_error = None;
                    }
                    ApiResponse::Failure { message } => {
                        model.like.last_error = Some(message.clone());
                        model.show_toast(message, ToastKind::Error);
                    }
                }
                caps.render.render();
            }

            Event::SurveySubmitted { answers } => {
                let fallback = Event::SurveySaved(ApiResponse::failure(messages::SURVEY_SAVE_FAILED));
                self.dispatch(model, caps, fallback, move |api| {
                    api.submit_survey(&answers, Event::SurveySaved)
                });
            }

            Event::SurveySaved(response) => {
                match response {
                    ApiResponse::Success { data } => {
                        model.my_page.last_survey = Some(data);
                        model.show_toast(notices::SURVEY_SAVED, ToastKind::Success);
                    }
                    ApiResponse::Failure { message } => model.show_toast(message, ToastKind::Error),
                }
                caps.render.render();
            }

            Event::PasswordChangeRequested {
                new_password,
                confirm_password,
            } => {
                let fallback =
                    Event::PasswordChanged(ApiResponse::failure(messages::PASSWORD_CHANGE_FAILED));
                self.dispatch(model, caps, fallback, move |api| {
                    api.change_password(&new_password, &confirm_password, Event::PasswordChanged)
                });
            }

            Event::PasswordChanged(response) => {
                match response {
                    ApiResponse::Success { .. } => {
                        let after = model.config.after_password_change.clone();
                        if after.notify {
                            model.show_toast(notices::PASSWORD_CHANGED, ToastKind::Success);
                        }
                        if let Some(path) = after.redirect_to {
                            info!(%path, "password changed, navigating");
                            caps.navigation.navigate(path);
                        }
                    }
                    ApiResponse::Failure { message } => model.show_toast(message, ToastKind::Error),
                }
                caps.render.render();
            }

            Event::DiseaseListRequested => {
                let fallback =
                    Event::DiseaseListLoaded(ApiResponse::failure(messages::DISEASE_LIST_FAILED));
                self.dispatch(model, caps, fallback, |api| {
                    api.fetch_disease_list(Event::DiseaseListLoaded)
                });
            }

            Event::DiseaseListLoaded(response) => {
                match response {
                    ApiResponse::Success { data } => model.my_page.diseases = Some(data),
                    ApiResponse::Failure { message } => model.show_toast(message, ToastKind::Error),
                }
                caps.render.render();
            }

            Event::DiseaseDeleteRequested { survey_id } => {
                let fallback = Event::DiseaseDeleted {
                    survey_id,
                    response: ApiResponse::failure(messages::DISEASE_DELETE_FAILED),
                };
                self.dispatch(model, caps, fallback, move |api| {
                    api.delete_survey(survey_id, move |response| Event::DiseaseDeleted {
                        survey_id,
                        response,
                    })
                });
            }

            Event::DiseaseDeleted {
                survey_id,
                response,
            } => {
                match response {
                    ApiResponse::Success { .. } => {
                        let removed = model
                            .my_page
                            .diseases
                            .as_mut()
                            .is_some_and(|list| remove_survey(list, survey_id));
                        debug!(survey_id, removed, "survey deleted");
                    }
                    ApiResponse::Failure { message } => model.show_toast(message, ToastKind::Error),
                }
                caps.render.render();
            }

            Event::ProfileImageChangeRequested { image_path } => {
                let fallback =
                    Event::ProfileImageChanged(ApiResponse::failure(messages::PROFILE_IMAGE_FAILED));
                self.dispatch(model, caps, fallback, move |api| {
                    api.change_profile_image(&image_path, Event::ProfileImageChanged)
                });
            }

            Event::ProfileImageUploadRequested(file) => {
                let fallback =
                    Event::ProfileImageChanged(ApiResponse::failure(messages::PROFILE_IMAGE_FAILED));
                self.dispatch(model, caps, fallback, move |api| {
                    api.upload_profile_image(&file, Event::ProfileImageChanged)
                });
            }

            Event::ProfileImageChanged(response) => {
                match response {
                    ApiResponse::Success { .. } => {
                        model.show_toast(notices::PROFILE_IMAGE_CHANGED, ToastKind::Success);
                    }
                    ApiResponse::Failure { message } => model.show_toast(message, ToastKind::Error),
                }
                caps.render.render();
            }

            Event::UserInfoRequested => {
                let fallback = Event::UserInfoLoaded(ApiResponse::failure(messages::USER_INFO_FAILED));
                self.dispatch(model, caps, fallback, |api| {
                    api.fetch_user_info(Event::UserInfoLoaded)
                });
            }

            Event::UserInfoLoaded(response) => {
                match response {
                    ApiResponse::Success { data } => model.my_page.user_info = Some(data),
                    ApiResponse::Failure { message } => model.show_toast(message, ToastKind::Error),
                }
                caps.render.render();
            }

            Event::NicknameChangeRequested { nickname } => {
                let fallback = Event::NicknameChanged {
                    nickname: nickname.clone(),
                    response: ApiResponse::failure(messages::NICKNAME_CHANGE_FAILED),
                };
                self.dispatch(model, caps, fallback, move |api| {
                    let requested = nickname.clone();
                    api.change_nickname(&nickname, move |response| Event::NicknameChanged {
                        nickname: requested,
                        response,
                    })
                });
            }

            Event::NicknameChanged { nickname, response } => {
                match response {
                    ApiResponse::Success { .. } => {
                        model.my_page.nickname = Some(nickname);
                        model.show_toast(notices::NICKNAME_CHANGED, ToastKind::Success);
                    }
                    ApiResponse::Failure { message } => model.show_toast(message, ToastKind::Error),
                }
                caps.render.render();
            }

            Event::EmailVerificationRequested { email } => {
                let fallback = Event::EmailVerificationSent(ApiResponse::failure(
                    messages::EMAIL_VERIFICATION_FAILED,
                ));
                self.dispatch(model, caps, fallback, move |api| {
                    api.send_email_verification(&email, Event::EmailVerificationSent)
                });
            }

            Event::EmailVerificationSent(response) => {
                match response {
                    ApiResponse::Success { data } => model.show_toast(data, ToastKind::Info),
                    ApiResponse::Failure { message } => model.show_toast(message, ToastKind::Error),
                }
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::from(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remove_survey_from_array() {
        let mut list = json!([{ "surveyId": 1 }, { "surveyId": 2 }]);
        assert!(remove_survey(&mut list, 1));
        assert_eq!(list, json!([{ "surveyId": 2 }]));
        assert!(!remove_survey(&mut list, 9));
    }

    #[test]
    fn test_remove_survey_from_envelope() {
        let mut list = json!({ "data": [{ "surveyId": 3, "disease": "flu" }] });
        assert!(remove_survey(&mut list, 3));
        assert_eq!(list, json!({ "data": [] }));
    }

    #[test]
    fn test_remove_survey_ignores_unknown_shapes() {
        let mut list = json!({ "items": [] });
        assert!(!remove_survey(&mut list, 1));
        let mut text = json!("nothing");
        assert!(!remove_survey(&mut text, 1));
    }
}
