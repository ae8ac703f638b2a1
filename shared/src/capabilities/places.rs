//! Place-lookup capability backed by the shell's maps SDK.
//!
//! The shell owns the SDK script and the lookup callbacks; the core only sees
//! typed operations and a [`PlaceLookupResult`] per place id.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::geo::LatLon;

pub const SDK_LIBRARIES: &str = "places,geometry";

pub struct Places<Ev> {
    context: CapabilityContext<PlacesOperation, Ev>,
}

impl<Ev> Capability<Ev> for Places<Ev> {
    type Operation = PlacesOperation;
    type MappedSelf<MappedEv> = Places<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Places::new(self.context.map_event(f))
    }
}

impl<Ev> Places<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<PlacesOperation, Ev>) -> Self {
        Self { context }
    }

    /// Injects the SDK script. Callers go through [`SdkGuard`] so this runs
    /// at most once while a load is pending or after it succeeded.
    pub fn load_sdk<F>(&self, script_url: String, callback: F)
    where
        F: FnOnce(PlacesOutput) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let output = ctx
                .request_from_shell(PlacesOperation::LoadSdk { script_url })
                .await;
            ctx.update_app(callback(output));
        });
    }

    pub fn details<F>(&self, place_id: String, callback: F)
    where
        F: FnOnce(PlaceLookupResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let output = ctx
                .request_from_shell(PlacesOperation::GetDetails { place_id })
                .await;
            let result = match output {
                PlacesOutput::Details(result) => result,
                PlacesOutput::SdkReady | PlacesOutput::SdkFailed { .. } => {
                    PlaceLookupResult::Invalid
                }
            };
            ctx.update_app(callback(result));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlacesOperation {
    LoadSdk { script_url: String },
    GetDetails { place_id: String },
}

impl Operation for PlacesOperation {
    type Output = PlacesOutput;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PlacesOutput {
    SdkReady,
    SdkFailed { reason: String },
    Details(PlaceLookupResult),
}

/// Place metadata as returned by the lookup service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceRecord {
    pub place_id: String,
    pub name: String,
    pub formatted_address: String,
    pub location: Option<LatLon>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PlaceLookupResult {
    Found(PlaceRecord),
    NotFound,
    /// The service answered but the payload was unusable (bad status,
    /// missing geometry, SDK not loaded).
    Invalid,
}

/// Builds the SDK script URL for `base` keyed by `api_key`.
pub fn sdk_script_url(base: &str, api_key: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut()
        .append_pair("key", api_key)
        .append_pair("libraries", SDK_LIBRARIES);
    Ok(url.to_string())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SdkState {
    #[default]
    Unloaded,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// SDK is usable right away.
    Ready,
    /// Caller must issue the load request now.
    StartLoad,
    /// A load is already pending; wait for its result.
    InFlight,
}

/// Once-only initialisation guard for the maps SDK.
///
/// Lives for the lifetime of the core (one per process) and is never torn
/// down. A failed load returns to a loadable state so a later page visit can
/// try again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkGuard {
    state: SdkState,
    load_requests: u32,
}

impl SdkGuard {
    pub fn ensure(&mut self) -> EnsureOutcome {
        match self.state {
            SdkState::Ready => EnsureOutcome::Ready,
            SdkState::Loading => EnsureOutcome::InFlight,
            SdkState::Unloaded | SdkState::Failed => {
                self.state = SdkState::Loading;
                self.load_requests += 1;
                EnsureOutcome::StartLoad
            }
        }
    }

    pub fn mark_ready(&mut self) {
        self.state = SdkState::Ready;
    }

    pub fn mark_failed(&mut self) {
        if self.state != SdkState::Ready {
            self.state = SdkState::Failed;
        }
    }

    #[must_use]
    pub const fn state(&self) -> SdkState {
        self.state
    }

    /// Number of load requests handed out so far.
    #[must_use]
    pub const fn load_requests(&self) -> u32 {
        self.load_requests
    }
}
