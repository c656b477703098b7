//! Caller identity as established by the trusted upstream proxy

/// Verified identity of the user behind a request.
///
/// Authenticity is established upstream; this service only reads the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub display_name: String,
}

/// Everything the web layer knows about who is calling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub principal: Principal,
    /// Storage token forwarded by the upstream proxy, if any
    pub forwarded_token: Option<String>,
}
