//! HTTP client for the recsync protocol.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use reqwest::{RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, trace};

use recsync_core::error::{
    AuthError, ConflictError, Error, NotFoundError, ProtocolError, TransportError,
};
use recsync_core::{ApiToken, Result, StoreUrl};

use crate::endpoints::ErrorBody;

/// Default User-Agent header value.
const USER_AGENT: &str = concat!("recsync/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one store and one API token.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base: StoreUrl,
    token: Option<ApiToken>,
}

impl HttpClient {
    /// Create a client with default transport settings.
    pub fn new(base: StoreUrl, token: Option<ApiToken>) -> Result<Self> {
        Self::with_options(base, token, None, None)
    }

    pub(crate) fn with_options(
        base: StoreUrl,
        token: Option<ApiToken>,
        user_agent: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent.unwrap_or(USER_AGENT));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(transport_error)?;

        Ok(Self {
            client,
            base,
            token,
        })
    }

    /// Returns the store URL this client is configured for.
    pub fn base(&self) -> &StoreUrl {
        &self.base
    }

    /// Make an authenticated query (GET request).
    #[instrument(skip(self), fields(store = %self.base))]
    pub async fn query<Q, R>(&self, method: &str, params: &Q) -> Result<R>
    where
        Q: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        let url = self.base.endpoint(method);
        debug!(method, "store query");
        trace!(?params, "query parameters");

        let request = self.authorize(self.client.get(&url).query(params))?;
        let response = request.send().await.map_err(transport_error)?;

        handle_response(response).await
    }

    /// Make an authenticated procedure (POST request).
    #[instrument(skip(self, body), fields(store = %self.base))]
    pub async fn procedure<B, R>(&self, method: &str, body: &B) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = self.base.endpoint(method);
        debug!(method, "store procedure");

        let request = self.authorize(self.client.post(&url).json(body))?;
        let response = request.send().await.map_err(transport_error)?;

        handle_response(response).await
    }

    /// Attach the bearer token.
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token.as_ref().ok_or(AuthError::MissingToken)?;
        Ok(request.header(AUTHORIZATION, format!("Bearer {}", token.as_str())))
    }
}

/// Handle a response, parsing the body or the error.
async fn handle_response<R: DeserializeOwned>(response: reqwest::Response) -> Result<R> {
    let status = response.status();
    trace!(status = %status, "store response");

    if status.is_success() {
        response.json::<R>().await.map_err(|e| {
            ProtocolError::new(
                status.as_u16(),
                None,
                Some(format!("malformed response body: {}", e)),
            )
            .into()
        })
    } else {
        Err(parse_error_response(response).await)
    }
}

/// Parse an error response into the matching [`Error`] variant.
async fn parse_error_response(response: reqwest::Response) -> Error {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    // Bodies that are not JSON still carry a meaningful status.
    let body = response.json::<ErrorBody>().await.unwrap_or_default();

    classify(Some(status), None, body, retry_after)
}

/// Map a status code and/or error code to an [`Error`].
///
/// `record_name` names the record the error belongs to, when known; batch
/// items pass their own name and no status.
pub(crate) fn classify(
    status: Option<StatusCode>,
    record_name: Option<&str>,
    body: ErrorBody,
    retry_after: Option<u64>,
) -> Error {
    let code = body.error.as_deref().unwrap_or_default();

    match (status, code) {
        (Some(StatusCode::UNAUTHORIZED), _)
        | (_, "AuthenticationRequired" | "ExpiredToken" | "InvalidToken") => {
            AuthError::TokenRejected(body.message).into()
        }
        (Some(StatusCode::FORBIDDEN), _) | (_, "PermissionDenied") => Error::PermissionDenied {
            message: body.message.unwrap_or_else(|| "forbidden".to_string()),
        },
        (Some(StatusCode::NOT_FOUND), _) | (_, "NotFound" | "UnknownItem") => {
            let what = match record_name {
                Some(name) => NotFoundError::Record(name.to_string()),
                None => NotFoundError::Other(body.message.unwrap_or_else(|| code.to_string())),
            };
            what.into()
        }
        (Some(StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED), _)
        | (_, "Conflict" | "ServerRecordChanged") => ConflictError {
            record_name: record_name.unwrap_or_default().to_string(),
            server_change_tag: body.server_change_tag,
        }
        .into(),
        (Some(StatusCode::TOO_MANY_REQUESTS), _) | (_, "RateLimited" | "QuotaExceeded") => {
            Error::RateLimited {
                retry_after_secs: retry_after.or(body.retry_after),
            }
        }
        _ => ProtocolError::new(
            status.map(|s| s.as_u16()).unwrap_or_default(),
            body.error,
            body.message,
        )
        .into(),
    }
}

pub(crate) fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        TransportError::Timeout.into()
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
        .into()
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recsync_core::ErrorKind;

    fn body(code: &str) -> ErrorBody {
        ErrorBody {
            error: Some(code.to_string()),
            ..ErrorBody::default()
        }
    }

    #[test]
    fn client_creation() {
        let base = StoreUrl::new("https://records.example.com").unwrap();
        let client = HttpClient::new(base.clone(), None).unwrap();
        assert_eq!(client.base(), &base);
    }

    #[test]
    fn classify_by_status() {
        let cases = [
            (StatusCode::UNAUTHORIZED, ErrorKind::Auth),
            (StatusCode::FORBIDDEN, ErrorKind::PermissionDenied),
            (StatusCode::NOT_FOUND, ErrorKind::NotFound),
            (StatusCode::CONFLICT, ErrorKind::Conflict),
            (StatusCode::PRECONDITION_FAILED, ErrorKind::Conflict),
            (StatusCode::TOO_MANY_REQUESTS, ErrorKind::RateLimited),
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Protocol),
        ];
        for (status, kind) in cases {
            let err = classify(Some(status), None, ErrorBody::default(), None);
            assert_eq!(err.kind(), kind, "status {}", status);
        }
    }

    #[test]
    fn classify_item_errors_by_code() {
        let err = classify(None, Some("n1"), body("ServerRecordChanged"), None);
        match err {
            Error::Conflict(conflict) => assert_eq!(conflict.record_name, "n1"),
            other => panic!("expected conflict, got {:?}", other),
        }

        let err = classify(None, Some("n2"), body("UnknownItem"), None);
        assert!(matches!(err, Error::NotFound(NotFoundError::Record(ref n)) if n == "n2"));

        let err = classify(None, Some("n3"), body("SomethingElse"), None);
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn retry_after_header_wins() {
        let mut b = body("RateLimited");
        b.retry_after = Some(5);
        let err = classify(Some(StatusCode::TOO_MANY_REQUESTS), None, b, Some(30));
        assert!(matches!(
            err,
            Error::RateLimited {
                retry_after_secs: Some(30)
            }
        ));
    }
}
