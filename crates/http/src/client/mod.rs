//! Interceptor-aware HTTP client

pub mod error;
pub mod interceptor;
pub mod transport;

use crate::types::{ApiRequest, ApiResponse};
use error::ClientError;
use interceptor::{RequestInterceptor, ResponseInterceptor};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, PoisonError, RwLock};
use transport::{ReqwestTransport, Transport};

/// HTTP client that runs interceptors around a [`Transport`].
///
/// Cloning is cheap and clones share the same interceptor chain.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    request_interceptors: RwLock<Vec<Arc<dyn RequestInterceptor>>>,
    response_interceptors: RwLock<Vec<Arc<dyn ResponseInterceptor>>>,
}

impl HttpClient {
    /// Create a client over any transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                request_interceptors: RwLock::new(Vec::new()),
                response_interceptors: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Create a client over a default [`ReqwestTransport`]
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self::new(Arc::new(ReqwestTransport::new(base_url)?)))
    }

    /// Append a request interceptor
    pub fn add_request_interceptor(&self, interceptor: Arc<dyn RequestInterceptor>) {
        self.inner
            .request_interceptors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(interceptor);
    }

    /// Append a response interceptor
    pub fn add_response_interceptor(&self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.inner
            .response_interceptors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(interceptor);
    }

    /// Send a request through the interceptor chain
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let request_hooks = self
            .inner
            .request_interceptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for hook in &request_hooks {
            hook.on_request(&mut request);
        }

        debug!(
            method = %request.method,
            path = %request.path,
            retried = request.retried,
            "sending request"
        );
        let mut result = self.inner.transport.send(&request).await;

        let response_hooks = self
            .inner
            .response_interceptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for hook in &response_hooks {
            result = hook.on_response(self, request.clone(), result).await;
        }

        result
    }

    /// GET `path` and return the JSON body
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    /// POST a JSON body to `path` and return the JSON body
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json(body)?).await?.json()
    }
}
