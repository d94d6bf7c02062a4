//! Response checks
//!
//! A check is a named boolean assertion on one response. Failing checks
//! are counted in the `checks` rate but never stop a scenario.

use crate::models::{CheckRecord, RequestSample};

/// Name under which the status assertion is reported
pub const STATUS_CHECK_NAME: &str = "status was 200";

/// Assert that a request produced an HTTP 200
pub fn status_was_200(sample: &RequestSample) -> CheckRecord {
    CheckRecord {
        name: STATUS_CHECK_NAME.to_string(),
        scenario: sample.scenario.clone(),
        endpoint: sample.endpoint,
        passed: sample.has_response() && sample.status_code == 200,
    }
}
