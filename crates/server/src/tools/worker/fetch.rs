//! sw_fetch tool implementation.
//!
//! Dispatches a fetch event. When the worker passes a request through, the
//! host performs the default network fetch, as a browser would.

use std::collections::BTreeMap;

use hearth_client::{Fetcher, FetchOutcome, Passthrough, Request, RequestClass, ResponseSource, Worker};
use hearth_core::Error;
use reqwest::Method;
use reqwest::header::{self, HeaderValue};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// The URL to fetch. Paths resolve against the site origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Accept header. A value containing "text/html" marks a page navigation.
    #[serde(default)]
    pub accept: Option<String>,

    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request body, sent as UTF-8.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The request URL after resolution.
    pub url: String,
    /// Where the response came from.
    pub source: ResponseSource,
    /// Set when the worker did not intercept the request.
    pub passthrough: Option<Passthrough>,
    /// Set when the worker intercepted the request.
    pub class: Option<RequestClass>,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossy.
    pub body: String,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl<F: Fetcher>(worker: &Worker<F>, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(worker, &params)?;

    let (response, source, passthrough, class) = match worker.fetch(&request).await {
        FetchOutcome::Responded { response, source, class } => (response, source, None, Some(class)),
        FetchOutcome::Passthrough(reason) => {
            tracing::debug!(url = %request.url, ?reason, "default network fetch");
            let response = worker.fetcher().fetch(&request).await?;
            (response, ResponseSource::Network, Some(reason), None)
        }
    };

    let output = SwFetchOutput {
        url: request.url.to_string(),
        source,
        passthrough,
        class,
        status: response.status.as_u16(),
        status_text: response.status_text().to_string(),
        headers: response.header_pairs(),
        body: response.text(),
    };
    json_result(&output)
}

fn build_request<F: Fetcher>(worker: &Worker<F>, params: &SwFetchParams) -> Result<Request, Error> {
    let url = worker.config().resolve(&params.url)?;
    let method = Method::from_bytes(params.method.trim().to_uppercase().as_bytes())
        .map_err(|e| Error::InvalidInput(format!("invalid method {:?}: {e}", params.method)))?;

    let headers: Vec<(String, String)> = params.headers.clone().into_iter().collect();
    let mut request = Request::new(method, url).with_header_pairs(&headers)?;
    if let Some(accept) = &params.accept {
        let value = HeaderValue::from_str(accept)
            .map_err(|e| Error::InvalidInput(format!("invalid accept header: {e}")))?;
        request = request.with_header(header::ACCEPT, value);
    }
    if let Some(body) = &params.body {
        request = request.with_body(body.clone());
    }
    Ok(request)
}
