use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Identity of the caller on whose behalf a request is routed
pub type CallerId = Uuid;

/// Per-request context shared by the router, strategies, and providers
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Authenticated caller, if any
    pub caller: Option<CallerId>,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Context for an anonymous caller with a fresh cancellation token
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for an identified caller
    pub fn for_caller(caller: CallerId) -> Self {
        Self {
            caller: Some(caller),
            cancellation: CancellationToken::new(),
        }
    }

    /// Replace the cancellation token, e.g. with a child of a server shutdown token
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Token observed by long-running work on behalf of this request
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Whether the request has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
