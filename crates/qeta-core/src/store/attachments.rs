//! Attachment storage
//!
//! Attachments are written once and never modified or deleted through the
//! store. Questions and answers reference them through junction tables.

use rusqlite::{params, OptionalExtension, Row, Transaction};
use tracing::debug;

use super::rows::datetime;
use super::{now_ms, Store};
use crate::models::{Attachment, AttachmentParams, LocationType};
use crate::storage::{StorageError, StorageResult};

const ATTACHMENT_COLUMNS: &str = "id, uuid, location_type, location_uri, path, binary_image, \
     mime_type, extension, creator, created";

impl Store {
    /// Store a new attachment
    ///
    /// Inline (`database`) attachments must carry bytes; external ones must not.
    pub fn post_attachment(&self, params: &AttachmentParams) -> StorageResult<Attachment> {
        validate_attachment(params)?;

        self.db.write(|tx| {
            tx.execute(
                r#"
                INSERT INTO attachments
                    (uuid, location_type, location_uri, path, binary_image,
                     mime_type, extension, creator, created)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                params![
                    params.uuid,
                    params.location_type.as_str(),
                    params.location_uri,
                    params.path,
                    params.binary_image,
                    params.mime_type,
                    params.extension,
                    params.creator,
                    now_ms(),
                ],
            )?;
            let id = tx.last_insert_rowid();
            debug!("Stored attachment {} ({}) as id {}", params.uuid, params.location_type, id);

            let sql = format!("SELECT {} FROM attachments WHERE id = ?", ATTACHMENT_COLUMNS);
            Ok(tx.query_row(&sql, params![id], attachment_from_row)?)
        })
    }

    /// Look up an attachment by its external uuid
    pub fn get_attachment(&self, uuid: &str) -> StorageResult<Option<Attachment>> {
        self.db.read(|tx| {
            let sql = format!("SELECT {} FROM attachments WHERE uuid = ?", ATTACHMENT_COLUMNS);
            Ok(tx
                .query_row(&sql, params![uuid], attachment_from_row)
                .optional()?)
        })
    }
}

fn validate_attachment(params: &AttachmentParams) -> StorageResult<()> {
    let invalid = |details: &str| StorageError::InvalidAttachment {
        uuid: params.uuid.clone(),
        details: details.to_string(),
    };

    if params.uuid.trim().is_empty() {
        return Err(invalid("uuid is empty"));
    }
    match (params.location_type.is_inline(), &params.binary_image) {
        (true, None) => Err(invalid("database attachments need binary content")),
        (false, Some(_)) => Err(invalid("external attachments cannot carry binary content")),
        _ => Ok(()),
    }
}

fn attachment_from_row(row: &Row) -> rusqlite::Result<Attachment> {
    let location_type: String = row.get(2)?;
    let location_type = location_type.parse::<LocationType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })?;

    Ok(Attachment {
        id: row.get(0)?,
        uuid: row.get(1)?,
        location_type,
        location_uri: row.get(3)?,
        path: row.get(4)?,
        binary_image: row.get(5)?,
        mime_type: row.get(6)?,
        extension: row.get(7)?,
        creator: row.get(8)?,
        created: datetime(row, 9)?,
    })
}

/// Replace the attachments linked to a question
///
/// Unknown attachment ids violate a foreign key and fail the operation.
pub(crate) fn replace_question_images(
    tx: &Transaction,
    question_id: i64,
    images: &[i64],
) -> StorageResult<()> {
    tx.execute(
        "DELETE FROM question_attachments WHERE question_id = ?",
        params![question_id],
    )?;
    for image in images {
        tx.execute(
            "INSERT OR IGNORE INTO question_attachments (question_id, attachment_id) VALUES (?, ?)",
            params![question_id, image],
        )?;
    }
    Ok(())
}

/// Replace the attachments linked to an answer
pub(crate) fn replace_answer_images(
    tx: &Transaction,
    answer_id: i64,
    images: &[i64],
) -> StorageResult<()> {
    tx.execute(
        "DELETE FROM answer_attachments WHERE answer_id = ?",
        params![answer_id],
    )?;
    for image in images {
        tx.execute(
            "INSERT OR IGNORE INTO answer_attachments (answer_id, attachment_id) VALUES (?, ?)",
            params![answer_id, image],
        )?;
    }
    Ok(())
}
