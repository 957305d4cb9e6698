//! Tollgate HTTP client
//!
//! A thin layer over `reqwest` that models each call as an owned [`ApiRequest`]
//! snapshot and runs it through an ordered chain of request and response
//! interceptors. Response interceptors receive the client itself so they can
//! replay a request after repairing whatever made it fail.

#[macro_use]
extern crate tracing;

pub mod client;
pub mod types;

pub use client::error::ClientError;
pub use client::interceptor::{RequestInterceptor, ResponseInterceptor};
pub use client::transport::{ReqwestTransport, ReqwestTransportBuilder, Transport};
pub use client::HttpClient;
pub use types::{ApiRequest, ApiResponse};

pub use reqwest::header;
pub use reqwest::{Method, StatusCode};
