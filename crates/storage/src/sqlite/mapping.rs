use interview_core::model::{CompletedInterview, Session};
use serde::{Serialize, de::DeserializeOwned};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn encode_payload<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

fn decode_payload<T: DeserializeOwned>(raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn count_from_i64(field: &'static str, v: i64) -> Result<usize, StorageError> {
    usize::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_session_row(row: &sqlx::sqlite::SqliteRow) -> Result<Session, StorageError> {
    let payload: String = row.try_get("payload").map_err(ser)?;
    let session: Session = decode_payload(&payload)?;
    let key: String = row.try_get("session_id").map_err(ser)?;
    if session.id().as_str() != key {
        return Err(StorageError::Serialization(format!(
            "payload id {} does not match row key {key}",
            session.id()
        )));
    }
    Ok(session)
}

pub(crate) fn map_completed_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<CompletedInterview, StorageError> {
    let payload: String = row.try_get("payload").map_err(ser)?;
    let record: CompletedInterview = decode_payload(&payload)?;
    let key: String = row.try_get("candidate_id").map_err(ser)?;
    if record.candidate.id.to_string() != key {
        return Err(StorageError::Serialization(format!(
            "payload candidate {} does not match row key {key}",
            record.candidate.id
        )));
    }
    Ok(record)
}
