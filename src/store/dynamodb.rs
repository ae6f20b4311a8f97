use crate::{common, read, store, write};

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, error};
use std::fmt;

/// Error codes DynamoDB returns for transient conditions.
const TRANSIENT_ERROR_CODES: [&str; 6] = [
    "InternalServerError",
    "ProvisionedThroughputExceededException",
    "RequestLimitExceeded",
    "ServiceUnavailable",
    "ThrottlingException",
    "TransactionConflictException",
];

/// Error codes DynamoDB returns for requests that will never succeed as sent.
const VALIDATION_ERROR_CODES: [&str; 3] = [
    "ItemCollectionSizeLimitExceededException",
    "ResourceNotFoundException",
    "ValidationException",
];

/// Classify an SDK error into a store error.
pub(crate) fn classify<E, R>(err: error::SdkError<E, R>) -> store::StoreError
where
    E: error::ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: fmt::Debug + Send + Sync + 'static,
{
    let message = error::DisplayErrorContext(&err).to_string();
    match &err {
        error::SdkError::ConstructionFailure(_) => store::StoreError::Validation(message),
        error::SdkError::TimeoutError(_)
        | error::SdkError::DispatchFailure(_)
        | error::SdkError::ResponseError(_) => store::StoreError::Unavailable(message),
        _ => match err.as_service_error().and_then(|service| service.code()) {
            Some("ConditionalCheckFailedException") => store::StoreError::ConditionalCheckFailed,
            Some(code) if TRANSIENT_ERROR_CODES.contains(&code) => {
                store::StoreError::Unavailable(message)
            }
            Some(code) if VALIDATION_ERROR_CODES.contains(&code) => {
                store::StoreError::Validation(message)
            }
            _ => store::StoreError::Other(message),
        },
    }
}

#[async_trait]
impl store::Store for Client {
    async fn put_item(&self, request: write::put_item::PutItem) -> Result<(), store::StoreError> {
        request.send(self).await.map_err(classify)?;
        Ok(())
    }

    async fn get_item(
        &self,
        request: read::get_item::GetItem,
    ) -> Result<Option<common::Item>, store::StoreError> {
        let output = request.send(self).await.map_err(classify)?;
        Ok(output.item)
    }

    async fn delete_item(
        &self,
        request: write::delete_item::DeleteItem,
    ) -> Result<(), store::StoreError> {
        request.send(self).await.map_err(classify)?;
        Ok(())
    }

    async fn query(
        &self,
        request: read::query::Query,
    ) -> Result<store::QueryPage, store::StoreError> {
        let output = request.send(self).await.map_err(classify)?;
        Ok(store::QueryPage {
            items: output.items.unwrap_or_default(),
            last_evaluated_key: output.last_evaluated_key.filter(|key| !key.is_empty()),
        })
    }
}
