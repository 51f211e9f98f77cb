use crate::utils::errors::RotatorError;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Errors returned by the ESA OpenAPI endpoint.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Structured error body returned with a non-2xx status.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Readable message extracted from a [`ServiceError`].
    #[error("{0}")]
    Message(String),
}

/// Error payload returned by the service, kept close to what the provider SDK exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceError {
    pub status: u16,
    pub code: String,
    /// `code: <status>, <Message> request id: <RequestId>`
    pub message: String,
    pub request_id: String,
    /// Raw response body.
    pub data: Option<String>,
}

impl ServiceError {
    /// Build from the HTTP status and the raw body of a failed call.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        let code = field("Code");
        let request_id = field("RequestId");
        let mut detail = field("Message");
        if detail.is_empty() && parsed.is_none() {
            detail = body.trim().to_string();
        }

        Self {
            status,
            message: format!("code: {status}, {detail} request id: {request_id}"),
            code,
            request_id,
            data: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Message with the service's `Recommend` hint appended when the payload carries one.
    pub fn readable_message(&self) -> String {
        let Some(data) = self.data.as_deref() else {
            return self.message.clone();
        };

        match serde_json::from_str::<Value>(data) {
            Ok(Value::Object(map)) => match map.get("Recommend") {
                Some(Value::String(recommend)) => format!("{}: {recommend}", self.message),
                Some(recommend) => format!("{}: {recommend}", self.message),
                None => self.message.clone(),
            },
            _ => self.message.clone(),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SDKError: StatusCode: {}, Code: {}, Message: {}",
            self.status, self.code, self.message
        )?;
        if let Some(data) = &self.data {
            write!(f, ", Data: {data}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ServiceError {}

/// Replace a service error with its readable message; every other error passes through.
pub fn translate(err: RotatorError) -> RotatorError {
    match err {
        RotatorError::Api(ApiError::Service(service)) => {
            RotatorError::Api(ApiError::Message(service.readable_message()))
        }
        other => other,
    }
}
