use base64::{
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
    Engine,
};
use log::{debug, warn};
use serde::Deserialize;

/// Identity hints read from the payload segment of a bearer token.
///
/// The signature is never checked here. The backend validates the token on
/// every request, so these claims only decide what the client shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub exp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    uid: Option<String>,
    sub: Option<String>,
    user_id: Option<String>,
    email: Option<String>,
    name: Option<String>,
    exp: Option<i64>,
}

impl SessionClaims {
    /// Parse a `header.payload.signature` token.
    ///
    /// Returns `None` for anything that is not a three-segment token whose
    /// payload is JSON carrying a non-empty `uid`, `sub` or `user_id`.
    pub fn parse(token: &str) -> Option<Self> {
        let segments: Vec<&str> = token.trim().split('.').collect();
        let [_, payload, _] = segments.as_slice() else {
            warn!("Token is not a three segment credential");
            return None;
        };

        let bytes = decode_segment(payload)?;
        let raw: RawClaims = match serde_json::from_slice(&bytes) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Token payload is not valid json: {}", e);
                return None;
            }
        };

        let user_id = [raw.uid, raw.sub, raw.user_id]
            .into_iter()
            .flatten()
            .find(|id| !id.trim().is_empty());
        let Some(user_id) = user_id else {
            warn!("Token payload carries no user id");
            return None;
        };

        debug!("Session user {}", user_id);
        Some(Self {
            user_id,
            email: raw.email,
            name: raw.name,
            exp: raw.exp,
        })
    }
}

fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let trimmed = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .map_err(|e| warn!("Token payload is not base64: {}", e))
        .ok()
}
