//! Request functions run by virtual users
//!
//! Each function issues one GET, records the tagged sample and the
//! `status was 200` check, and returns the sample.

use crate::{
    checks,
    client::issue_request,
    executor::ExecutionContext,
    models::RequestSample,
    types::{Endpoint, ExecTarget},
};

/// GET `/books`, tagged `books=list-books`
pub async fn list_books(ctx: &ExecutionContext, scenario: &str) -> RequestSample {
    request_and_check(ctx, scenario, Endpoint::ListBooks).await
}

/// GET `/new-books`, tagged `books=new-books`
pub async fn new_books(ctx: &ExecutionContext, scenario: &str) -> RequestSample {
    request_and_check(ctx, scenario, Endpoint::NewBooks).await
}

/// One iteration of `exec`; the default exec requests both endpoints in order
pub async fn run_iteration(ctx: &ExecutionContext, scenario: &str, exec: ExecTarget) -> Vec<RequestSample> {
    let mut samples = Vec::with_capacity(exec.endpoints().len());
    for endpoint in exec.endpoints() {
        let sample = match endpoint {
            Endpoint::ListBooks => list_books(ctx, scenario).await,
            Endpoint::NewBooks => new_books(ctx, scenario).await,
        };
        samples.push(sample);
    }
    samples
}

async fn request_and_check(ctx: &ExecutionContext, scenario: &str, endpoint: Endpoint) -> RequestSample {
    let sample = issue_request(
        ctx.client.as_ref(),
        &ctx.base_url,
        scenario,
        endpoint,
        ctx.request_timeout,
    )
    .await;

    ctx.request_logger.log_http_request(&endpoint.url(&ctx.base_url), &sample).await;
    ctx.metrics.record_request(sample.clone()).await;
    ctx.metrics.record_check(checks::status_was_200(&sample)).await;

    sample
}
