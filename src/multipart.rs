//! Multipart form parsing.
//!
//! The whole body is already buffered by the time binding runs, so the
//! `multer` stream is fed a single chunk and driven to completion on the
//! calling thread. The configured limit bounds the whole stream; a larger
//! body fails the request.

use std::collections::HashMap;
use std::convert::Infallible;

use bytes::Bytes;
use multer::{Constraints, Multipart, SizeLimit};
use tracing::debug;

use crate::error::BindError;
use crate::request::{FileHeader, RequestParts};

/// Value parts and file parts of a multipart body, keyed by part name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    values: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<FileHeader>>,
}

impl MultipartForm {
    /// Every value part named `name`, in encounter order.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.values
            .get(name)
            .map(|values| values.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// First value part named `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name)?.first().map(String::as_str)
    }

    /// Every file part named `name`, in encounter order.
    pub fn files(&self, name: &str) -> &[FileHeader] {
        self.files.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn insert_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    pub fn insert_file(&mut self, name: impl Into<String>, file: FileHeader) {
        self.files.entry(name.into()).or_default().push(file);
    }
}

/// Parses the request body as `multipart/form-data`.
pub fn parse(req: &dyn RequestParts, limit: u64) -> Result<MultipartForm, BindError> {
    let content_type = req.content_type().unwrap_or_default();
    let boundary = multer::parse_boundary(content_type).map_err(|_| BindError::Multipart {
        cause: "request Content-Type isn't multipart/form-data".to_string(),
    })?;
    let body = Bytes::copy_from_slice(req.body());
    if body.len() as u64 > limit {
        return Err(BindError::Multipart {
            cause: format!("request body of {} bytes exceeds the {limit} byte limit", body.len()),
        });
    }

    let stream = futures::stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(limit));
    let mut multipart = Multipart::with_constraints(stream, boundary, constraints);

    let form = futures::executor::block_on(async move {
        let mut form = MultipartForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            // an empty file input is submitted with `filename=""` and binds as a value
            let filename = field
                .file_name()
                .filter(|filename| !filename.is_empty())
                .map(str::to_string);
            let content_type = field.content_type().map(|mime| mime.to_string());
            match filename {
                Some(filename) => {
                    let data = field.bytes().await?;
                    form.insert_file(name, FileHeader::new(filename, content_type, data));
                }
                None => {
                    let text = field.text().await?;
                    form.insert_value(name, text);
                }
            }
        }
        Ok::<MultipartForm, multer::Error>(form)
    })
    .map_err(|e| BindError::Multipart { cause: e.to_string() })?;

    debug!(
        value_parts = form.values.len(),
        file_parts = form.files.len(),
        "Multipart form parsed"
    );
    Ok(form)
}
