//! Bearer attachment and refresh-and-retry for the HTTP client

use crate::manager::{SessionManager, WeakSession};
use async_trait::async_trait;
use std::sync::Arc;
use tollgate_http::{
    ApiRequest, ApiResponse, ClientError, HttpClient, RequestInterceptor, ResponseInterceptor,
};

/// Request and response interceptor pair bound to a session
pub struct AuthInterceptor {
    session: WeakSession,
}

impl AuthInterceptor {
    pub fn new(session: &SessionManager) -> Self {
        Self {
            session: session.downgrade(),
        }
    }

    /// Register this interceptor on both sides of `client`
    pub fn register(self: Arc<Self>, client: &HttpClient) {
        client.add_request_interceptor(self.clone());
        client.add_response_interceptor(self);
    }
}

impl RequestInterceptor for AuthInterceptor {
    fn on_request(&self, request: &mut ApiRequest) {
        let Some(token) = self.session.upgrade().and_then(|s| s.access_token()) else {
            return;
        };
        if let Err(err) = request.set_bearer(&token) {
            warn!(path = %request.path, error = %err, "access token is not a valid header value");
        }
    }
}

#[async_trait]
impl ResponseInterceptor for AuthInterceptor {
    async fn on_response(
        &self,
        client: &HttpClient,
        mut request: ApiRequest,
        result: Result<ApiResponse, ClientError>,
    ) -> Result<ApiResponse, ClientError> {
        let error = match result {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };

        if !error.is_unauthorized() || request.skip_auth_refresh {
            return Err(error);
        }

        let Some(session) = self.session.upgrade() else {
            return Err(error);
        };

        if request.retried {
            debug!(path = %request.path, "replayed request was rejected again");
            session.expire_session().await;
            return Err(error);
        }

        if session.refresh_token().is_none() {
            return Err(error);
        }

        request.retried = true;
        match session.refresh_access_token().await {
            Ok(token) => {
                debug!(path = %request.path, "replaying request with refreshed token");
                request.set_bearer(&token)?;
                client.send(request).await
            }
            Err(refresh_error) => {
                session.expire_session().await;
                Err(ClientError::Interceptor(Arc::new(refresh_error)))
            }
        }
    }
}
