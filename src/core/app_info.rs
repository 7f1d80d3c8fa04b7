//! Request, session and user metadata attached to each record
//!
//! An [`AppInfoProvider`] is consulted once per record. Whatever it leaves
//! out is omitted from the output. [`AmbientAppInfo`] is the stock provider
//! over an application's request/session/user state; it always fills all
//! three fields and uses `"-"` whenever a lookup is unavailable, inactive or
//! fails.

use super::error::Result;
use super::raw_record::RawRecord;

/// Placeholder for metadata that cannot be determined
pub const UNKNOWN: &str = "-";

/// Optional metadata fields; `None` means "omit from the record"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppInfo {
    pub ip: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

impl AppInfo {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Supplies per-record metadata
///
/// Any `Fn(&RawRecord) -> AppInfo` closure is a provider, which is how a
/// custom prefix is plugged in.
pub trait AppInfoProvider: Send + Sync {
    fn app_info(&self, record: &RawRecord) -> AppInfo;
}

impl<F> AppInfoProvider for F
where
    F: Fn(&RawRecord) -> AppInfo + Send + Sync,
{
    fn app_info(&self, record: &RawRecord) -> AppInfo {
        self(record)
    }
}

/// Session as seen by the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub id: String,
    pub active: bool,
}

/// Read access to the host application's ambient request/session/user state
///
/// `Ok(None)` means the component exists but has nothing to report; `Err`
/// means the component is missing or misconfigured.
pub trait AmbientState: Send + Sync {
    /// Client address of the current request, if there is a request
    fn user_ip(&self) -> Option<String>;

    fn session(&self) -> Result<Option<SessionState>>;

    /// Identifier of the authenticated user
    fn identity_id(&self) -> Result<Option<String>>;
}

/// Provider backed by [`AmbientState`], with `"-"` for anything unknown
pub struct AmbientAppInfo<S> {
    state: S,
}

impl<S: AmbientState> AmbientAppInfo<S> {
    pub fn new(state: S) -> Self {
        Self { state }
    }

    fn ip(&self) -> String {
        self.state.user_ip().unwrap_or_else(|| UNKNOWN.to_string())
    }

    fn session_id(&self) -> String {
        match self.state.session() {
            Ok(Some(session)) if session.active => session.id,
            Ok(_) => UNKNOWN.to_string(),
            Err(e) => {
                log::debug!("session lookup failed, using placeholder: {}", e);
                UNKNOWN.to_string()
            }
        }
    }

    fn user_id(&self) -> String {
        match self.state.identity_id() {
            Ok(Some(id)) => id,
            Ok(None) => UNKNOWN.to_string(),
            Err(e) => {
                log::debug!("identity lookup failed, using placeholder: {}", e);
                UNKNOWN.to_string()
            }
        }
    }
}

impl<S: AmbientState> AppInfoProvider for AmbientAppInfo<S> {
    fn app_info(&self, _record: &RawRecord) -> AppInfo {
        AppInfo {
            ip: Some(self.ip()),
            user_id: Some(self.user_id()),
            session_id: Some(self.session_id()),
        }
    }
}
