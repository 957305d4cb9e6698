//! Interceptor hooks run by [`HttpClient`](super::HttpClient)

use super::HttpClient;
use super::error::ClientError;
use crate::types::{ApiRequest, ApiResponse};
use async_trait::async_trait;

/// Runs before every request is handed to the transport
pub trait RequestInterceptor: Send + Sync {
    fn on_request(&self, request: &mut ApiRequest);
}

/// Runs on every transport result, in registration order.
///
/// An interceptor may pass the result through, replace an error with a
/// response (typically by replaying `request` through `client`), or replace it
/// with a different error.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    async fn on_response(
        &self,
        client: &HttpClient,
        request: ApiRequest,
        result: Result<ApiResponse, ClientError>,
    ) -> Result<ApiResponse, ClientError>;
}
