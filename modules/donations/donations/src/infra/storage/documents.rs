//! Recording of uploaded files.
//!
//! Bytes are not stored here; object storage is somebody else's job. Each file
//! becomes a `documents` row with its SHA-256 and public URL.

use donations_sdk::{DocumentPurpose, FileRef, UploadedFile};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

use super::entity::document;
use crate::domain::error::DomainError;

/// Keep `[A-Za-z0-9._-]`, replace everything else with `_`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "file".to_owned()
    } else {
        cleaned
    }
}

pub fn sha256_hex(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

pub async fn record_uploads<C: ConnectionTrait>(
    conn: &C,
    files: &[UploadedFile],
    uploaded_by: Uuid,
    purpose: DocumentPurpose,
    external_base_url: &str,
) -> Result<Vec<FileRef>, DomainError> {
    let base = external_base_url.trim_end_matches('/');
    let mut refs = Vec::with_capacity(files.len());
    for file in files {
        let id = Uuid::now_v7();
        let filename = sanitize_filename(&file.filename);
        let url = format!("{base}/uploads/{id}-{filename}");
        let sha256 = sha256_hex(&file.content);
        document::ActiveModel {
            id: Set(id),
            url: Set(url.clone()),
            filename: Set(filename.clone()),
            hash_sha256: Set(sha256.clone()),
            uploaded_by: Set(uploaded_by),
            purpose: Set(purpose.as_str().to_owned()),
            signed_by: Set(None),
            signed_at: Set(None),
            created_at: Set(OffsetDateTime::now_utc()),
        }
        .insert(conn)
        .await?;
        refs.push(FileRef {
            document_id: id,
            filename,
            url,
            sha256,
        });
    }
    Ok(refs)
}
