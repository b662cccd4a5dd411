use reqwest::StatusCode;

/// Control state for one authenticated request.
///
/// The transitions encode the whole recovery policy: one refresh-and-resend
/// on the first 401, and nothing else. A 401 on the resent request is an
/// ordinary failure, so the flow can never loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFlow {
    /// The original request is in flight.
    Sent,
    /// A 401 was observed and the refresh endpoint is being called.
    Refreshing,
    /// The original request went out again with a fresh token.
    Resent,
}

/// The driver's next action, decided purely from the flow state and the
/// latest response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Deliver the response body to the caller.
    Deliver,
    /// Refresh the credential, then resend the original request.
    Refresh,
    /// Fail with the response's status and message.
    Fail,
}

impl RequestFlow {
    pub fn on_response(self, status: StatusCode) -> Step {
        match self {
            RequestFlow::Sent if status == StatusCode::UNAUTHORIZED => Step::Refresh,
            _ if status.is_success() => Step::Deliver,
            _ => Step::Fail,
        }
    }

    /// Entered while the refresh endpoint is being called.
    pub fn refreshing(self) -> RequestFlow {
        RequestFlow::Refreshing
    }

    /// The refresh succeeded and the original request is in flight again.
    pub fn resent(self) -> RequestFlow {
        RequestFlow::Resent
    }
}
