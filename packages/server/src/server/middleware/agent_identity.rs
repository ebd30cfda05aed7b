//! Agent identity extraction.
//!
//! Authentication itself lives upstream; by the time a request reaches this
//! API the authenticated agent's ID is asserted in the `x-agent-id` header.
//! Write routes require it and answer 401 when it is missing or malformed.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::common::AgentId;
use crate::server::error::ApiError;

pub const AGENT_ID_HEADER: &str = "x-agent-id";

/// The calling agent, as asserted by the upstream auth layer.
#[derive(Debug, Clone, Copy)]
pub struct AuthAgent(pub AgentId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthAgent
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AGENT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let id = AgentId::parse(header).map_err(|_| ApiError::Unauthorized)?;
        Ok(AuthAgent(id))
    }
}
