//! Multipart submissions (invoices and receipts).

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;
use donations_sdk::UploadedFile;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::api::rest::error::{ApiResult, bad_request, validation};

/// Text fields plus every part that carried a filename.
#[derive(Debug, Default)]
pub struct SubmissionForm {
    fields: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
}

impl SubmissionForm {
    /// Drain a multipart body.
    ///
    /// # Errors
    /// 400 for a malformed body.
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| bad_request(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_owned();
            match field.file_name().map(str::to_owned) {
                Some(filename) => {
                    let content = field.bytes().await.map_err(|e| bad_request(e.body_text()))?;
                    form.files.push(UploadedFile {
                        filename,
                        content: content.to_vec(),
                    });
                }
                None => {
                    let value = field.text().await.map_err(|e| bad_request(e.body_text()))?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    /// # Errors
    /// 400 when the field is missing or blank.
    pub fn required(&self, name: &str) -> ApiResult<&str> {
        self.text(name).ok_or_else(|| validation(name, "is required"))
    }

    /// # Errors
    /// 400 when the field is missing or not a UUID.
    pub fn uuid(&self, name: &str) -> ApiResult<Uuid> {
        Uuid::parse_str(self.required(name)?.trim()).map_err(|_| validation(name, "must be a UUID"))
    }

    /// # Errors
    /// 400 when the field is missing or not a decimal number.
    pub fn decimal(&self, name: &str) -> ApiResult<Decimal> {
        Decimal::from_str(self.required(name)?.trim()).map_err(|_| validation(name, "must be a decimal number"))
    }
}
