use serde::{Deserialize, Serialize};

use crate::ingest::StagedFile;

// Shapes from the Snowpipe REST API:
// https://docs.snowflake.com/en/user-guide/data-load-snowpipe-rest-apis
#[derive(Debug, Serialize)]
pub(crate) struct InsertFilesRequest<'a> {
    pub files: &'a [StagedFile],
}

/// Snowpipe's answer to an `insertFiles` call.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub request_id: Option<String>,
    pub response_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum InsertFilesResponse {
    Accepted(IngestResponse),
    Failure(super::ErrorResponse),
}
