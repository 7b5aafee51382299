use crate::error::ServiceError;
use lnk_core::{parse_bool, Expiry, Uid};
use serde::Deserialize;

/// Raw creation input as the HTTP layer hands it over: optional string
/// fields straight from a form or JSON body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRequest {
    pub url: Option<String>,
    pub uid: Option<String>,
    pub ttl: Option<String>,
    pub clip: Option<String>,
}

impl CreateRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }
}

/// Validated creation parameters.
#[derive(Debug, Clone)]
pub struct CreateParams {
    pub url: String,
    pub uid: Uid,
    pub expiry: Expiry,
    pub clip: bool,
}

impl CreateParams {
    /// Validates a raw request. Checks run in a fixed order (url, ttl,
    /// clip, uid) and the first failure wins.
    pub fn validate(request: CreateRequest) -> Result<Self, ServiceError> {
        let url = request
            .url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ServiceError::InvalidParameters("url not provided".into()))?;

        let expiry = Expiry::resolve(request.ttl.as_deref())?;

        let clip = match request.clip.as_deref() {
            None => false,
            Some(raw) => parse_bool(raw).map_err(|_| {
                ServiceError::InvalidParameters(format!("invalid clip value: {raw}"))
            })?,
        };

        let uid = match request.uid {
            Some(uid) => Uid::new(uid)?,
            None => Uid::generate(),
        };

        Ok(Self {
            url,
            uid,
            expiry,
            clip,
        })
    }
}
