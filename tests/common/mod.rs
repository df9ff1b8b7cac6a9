//! Request builders shared by the integration tests.

#![allow(dead_code)]

use bytes::Bytes;
use reqbind::BindRequest;

pub const BOUNDARY: &str = "XBOUNDARY";

/// A buffered request with the given headers and body.
pub fn request(uri: &str, headers: &[(&str, &str)], body: &str) -> BindRequest {
    let mut builder = http::Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    BindRequest::from_http(builder.body(Bytes::from(body.to_string())).unwrap())
}

pub fn get(uri: &str) -> BindRequest {
    request(uri, &[], "")
}

pub fn json(uri: &str, body: &str) -> BindRequest {
    request(uri, &[("content-type", "application/json")], body)
}

/// One multipart part: field name, file name for file parts, content.
pub type Part<'a> = (&'a str, Option<&'a str>, &'a str);

/// A `multipart/form-data` request built from `parts` in order.
pub fn multipart(uri: &str, parts: &[Part<'_>]) -> BindRequest {
    let mut body = String::new();
    for (name, filename, content) in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        match filename {
            Some(filename) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )),
            None => body.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")),
        }
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
    request(uri, &[("content-type", content_type.as_str())], &body)
}
