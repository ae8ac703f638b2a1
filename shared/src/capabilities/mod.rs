mod geolocation;
mod http;
mod navigation;
mod places;

pub use self::geolocation::{
    Geolocation, GeolocationError, GeolocationOperation, GeolocationResult, Position,
};
pub use self::http::{
    ApiBase, ContentType, FileUpload, Http, HttpError, MultipartForm, MAX_UPLOAD_BYTES,
};
pub use self::navigation::{Navigation, NavigationOperation};
pub use self::places::{
    sdk_script_url, EnsureOutcome, PlaceLookupResult, PlaceRecord, Places, PlacesOperation,
    PlacesOutput, SdkGuard, SdkState,
};

pub use crux_core::render::Render;

use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "crate::app::App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub geolocation: Geolocation<Event>,
    pub places: Places<Event>,
    pub navigation: Navigation<Event>,
}
