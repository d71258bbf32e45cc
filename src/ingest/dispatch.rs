use crate::{
    SnowpipeError, error,
    errors::ErrorKind,
    http::client::SnowpipeHttpClient,
    ingest::{SimpleIngestManager, StagedFile},
};

/// The `responseCode` Snowpipe returns once it has queued files for loading.
pub const SUCCESS_RESPONSE_CODE: &str = "SUCCESS";

/// Asks Snowpipe to load one staged file, given by its path relative to the
/// pipe's stage, e.g. `my/target/file/path.csv.gz`.
///
/// Fails with [`ErrorKind::Configuration`] when `manager` is `None`, before
/// anything is sent. Every other failure, including a `responseCode` other than
/// `SUCCESS`, is reported as [`ErrorKind::Ingestion`] keeping its message.
pub async fn trigger_ingestion<C: SnowpipeHttpClient>(
    manager: Option<&SimpleIngestManager<C>>,
    relative_file_path: &str,
) -> Result<(), SnowpipeError> {
    let manager = manager.ok_or_else(|| {
        error!(
            Configuration,
            "aborting snowpipe ingestion as the ingest manager is missing"
        )
    })?;

    submit(manager, relative_file_path)
        .await
        .map_err(|e| e.with_kind(ErrorKind::Ingestion))
}

async fn submit<C: SnowpipeHttpClient>(
    manager: &SimpleIngestManager<C>,
    relative_file_path: &str,
) -> Result<(), SnowpipeError> {
    let staged_files = [StagedFile::new(relative_file_path, None)];

    let resp = manager.ingest_files(&staged_files).await?;

    if resp.response_code != SUCCESS_RESPONSE_CODE {
        tracing::warn!(
            pipe = manager.pipe(),
            path = relative_file_path,
            response_code = resp.response_code.as_str(),
            "snowpipe did not accept file"
        );
        return Err(error!(
            Ingestion,
            message = format!(
                "snowpipe responded with {} instead of {} for {}",
                resp.response_code, SUCCESS_RESPONSE_CODE, relative_file_path
            )
        ));
    }

    tracing::info!(
        pipe = manager.pipe(),
        path = relative_file_path,
        request_id = resp.request_id.as_deref(),
        "snowpipe accepted file for loading"
    );

    Ok(())
}
