use bytes::Bytes;
use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Method, StatusCode, Url,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{Result, TransportError};

/// A fully-formed request handed to the transport.
///
/// The body is held as [`Bytes`], so it can be re-supplied unchanged for
/// every attempt of a retried call.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Parses `url` and creates a request; a malformed URL is an
    /// [`TransportError::InvalidRequest`].
    pub fn parse(method: Method, url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|err| TransportError::InvalidRequest(format!("invalid url '{url}': {err}")))?;
        Ok(Self::new(method, url))
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    /// Adds a header, replacing any previous value with the same name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` as the JSON body and sets `Content-Type`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value).map_err(|err| {
            TransportError::InvalidRequest(format!("json body serialization failed: {err}"))
        })?;
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.body = Some(Bytes::from(body));
        Ok(self)
    }
}

/// A response received from the wrapped executor, with its body fully read.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Body as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|err| {
            TransportError::Decode(format!(
                "invalid response JSON: {err}; body: {}",
                self.text()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{HttpRequest, HttpResponse};
    use crate::TransportError;
    use reqwest::{header, Method, StatusCode};
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn json_body_sets_content_type() {
        let request = HttpRequest::parse(Method::POST, "http://localhost/search")
            .expect("url must parse")
            .json(&json!({"name": "Kit"}))
            .expect("json must serialize");

        assert_eq!(
            request.headers.get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
            Some(&b"application/json"[..])
        );
        assert_eq!(request.body.as_deref(), Some(&br#"{"name":"Kit"}"#[..]));
    }

    #[test]
    fn malformed_url_is_invalid_request() {
        let err = HttpRequest::parse(Method::GET, "not a url").expect_err("must fail");
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }

    #[test]
    fn response_json_decode_error_includes_body() {
        #[derive(Debug, Deserialize)]
        struct Person {
            #[allow(dead_code)]
            name: String,
        }

        let response = HttpResponse::new(StatusCode::OK, "oops");
        match response.json::<Person>() {
            Err(TransportError::Decode(message)) => assert!(message.contains("oops")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
