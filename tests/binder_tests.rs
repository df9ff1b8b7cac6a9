mod common;

use std::collections::HashMap;
use std::thread;

use chrono::{DateTime, FixedOffset, Utc};
use common::{get, json, multipart, request};
use reqbind::binding::Location;
use reqbind::descriptor;
use reqbind::error::ConfigError;
use reqbind::{bind, bind_reflective, Bind, BindConfig, BindError, BindParameters, FileHeader, Reflect, RequestParts};
use serde::Deserialize;

#[derive(Debug, Default, PartialEq, Bind)]
struct ListItems {
    #[bind(in = "query", name = "item_id")]
    item_id: String,
    #[bind(in = "query", name = "page,omitempty", default = "1")]
    page: u16,
    #[bind(in = "query", name = "count")]
    count: i32,
    #[bind(in = "query", name = "ratio,omitempty", default = "0.5")]
    ratio: f32,
    #[bind(in = "query", name = "verbose,omitempty", default = "true")]
    verbose: bool,
    #[bind(in = "query", name = "limit,omitempty")]
    limit: Option<i64>,
    #[bind(in = "query", name = "id,omitempty")]
    ids: Vec<i64>,
    #[bind(in = "header", name = "X-Tag,omitempty")]
    tags: Vec<String>,
}

#[test]
fn test_scalar_kinds_and_defaults() {
    let req = get("/items?item_id=abc&count=3&id=1&id=2&limit=9");
    let items: ListItems = bind(&req, &BindConfig::default()).unwrap();
    assert_eq!(
        items,
        ListItems {
            item_id: "abc".into(),
            page: 1,
            count: 3,
            ratio: 0.5,
            verbose: true,
            limit: Some(9),
            ids: vec![1, 2],
            tags: Vec::new(),
        }
    );
}

#[test]
fn test_required_parameter_missing() {
    let req = get("/items?count=1");
    let err = bind::<ListItems>(&req, &BindConfig::default()).unwrap_err();
    assert_eq!(err.to_string(), "missing required parameter 'item_id' in query");

    // present but empty counts as missing
    let req = get("/items?item_id=&count=1");
    let err = bind::<ListItems>(&req, &BindConfig::default()).unwrap_err();
    assert_eq!(
        err,
        BindError::MissingParameter {
            name: "item_id".into(),
            location: Location::Query
        }
    );
}

#[test]
fn test_zero_literal_on_optional_field_yields_default() {
    let req = get("/items?item_id=a&count=1&page=0&verbose=false&ratio=0");
    let items: ListItems = bind(&req, &BindConfig::default()).unwrap();
    assert_eq!(items.page, 1);
    assert!(items.verbose);
    assert_eq!(items.ratio, 0.5);
}

#[test]
fn test_required_field_keeps_explicit_zero() {
    let req = get("/items?item_id=a&count=0");
    let items: ListItems = bind(&req, &BindConfig::default()).unwrap();
    assert_eq!(items.count, 0);
}

#[test]
fn test_optional_scalar_without_default_stays_none() {
    let req = get("/items?item_id=a&count=1&limit=0");
    let items: ListItems = bind(&req, &BindConfig::default()).unwrap();
    assert_eq!(items.limit, None);
}

#[test]
fn test_repeated_header_values() {
    let req = request("/items?item_id=a&count=1", &[("X-Tag", "one"), ("X-Tag", "two")], "");
    let items: ListItems = bind(&req, &BindConfig::default()).unwrap();
    assert_eq!(items.tags, vec!["one".to_string(), "two".to_string()]);
}

#[test]
fn test_conversion_errors_name_the_parameter() {
    let req = get("/items?item_id=a&count=1&page=70000");
    let err = bind::<ListItems>(&req, &BindConfig::default()).unwrap_err();
    assert!(err.to_string().starts_with("invalid parameter 'page'"), "{err}");

    let req = get("/items?item_id=a&count=1&verbose=yes");
    let err = bind::<ListItems>(&req, &BindConfig::default()).unwrap_err();
    assert!(matches!(err, BindError::InvalidParameter { ref name, .. } if name == "verbose"));

    let req = get("/items?item_id=a&count=1&id=1&id=x");
    let err = bind::<ListItems>(&req, &BindConfig::default()).unwrap_err();
    assert!(matches!(err, BindError::InvalidParameter { ref name, .. } if name == "id"));
    assert_eq!(err.status(), http::StatusCode::BAD_REQUEST);
}

#[derive(Debug, Default, PartialEq, Bind)]
struct Window {
    #[bind(in = "query", name = "from")]
    from: DateTime<FixedOffset>,
    #[bind(in = "query", name = "until,omitempty")]
    until: Option<DateTime<Utc>>,
}

#[test]
fn test_time_parameters_are_rfc3339() {
    let req = get("/window?from=2024-05-06T07:08:09%2B02:00&until=2024-05-07T00:00:00Z");
    let window: Window = bind(&req, &BindConfig::default()).unwrap();
    assert_eq!(window.from.to_rfc3339(), "2024-05-06T07:08:09+02:00");
    assert_eq!(window.until.map(|t| t.to_rfc3339()).as_deref(), Some("2024-05-07T00:00:00+00:00"));

    let req = get("/window?from=2024-05-06");
    let err = bind::<Window>(&req, &BindConfig::default()).unwrap_err();
    assert!(err.to_string().starts_with("invalid time format for parameter 'from'"), "{err}");

    // the zero instant on an optional field is treated as absent
    let req = get("/window?from=2024-05-06T07:08:09Z&until=0001-01-01T00:00:00Z");
    let window: Window = bind(&req, &BindConfig::default()).unwrap();
    assert_eq!(window.until, None);
}

#[derive(Debug, Default, PartialEq, Bind)]
struct Since {
    #[bind(in = "query", name = "at,omitempty", default = "2000-01-01T00:00:00Z")]
    at: DateTime<Utc>,
}

#[test]
fn test_unix_epoch_is_a_real_instant() {
    let req = get("/since?at=1970-01-01T00:00:00Z");
    let since: Since = bind(&req, &BindConfig::default()).unwrap();
    assert_eq!(since.at, DateTime::<Utc>::UNIX_EPOCH);

    let since: Since = bind(&get("/since"), &BindConfig::default()).unwrap();
    assert_eq!(since.at.to_rfc3339(), "2000-01-01T00:00:00+00:00");
}

#[derive(Debug, Default, PartialEq, Bind)]
struct Trace {
    #[bind(in = "header", name = "X-Trace-Id,omitempty", default = "none")]
    trace_id: String,
}

#[derive(Debug, Default, PartialEq, Bind)]
struct Paging {
    #[bind(in = "query", name = "size,omitempty", default = "10")]
    size: u32,
    #[bind(flatten)]
    trace: Option<Trace>,
}

#[derive(Debug, Default, PartialEq, Bind)]
struct Nested {
    #[bind(in = "path", name = "id")]
    id: u64,
    #[bind(flatten)]
    paging: Option<Box<Paging>>,
    #[bind(in = "query", name = "q,omitempty")]
    q: String,
}

#[test]
fn test_embedded_structs_flatten_in_declaration_order() {
    let info = Nested::type_info();
    let descriptors = descriptor::describe(info).unwrap();
    let names: Vec<&str> = descriptors.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["id", "size", "X-Trace-Id", "q"]);
    let trace = &descriptors[2];
    assert_eq!(trace.path.len(), 3);
    assert!(trace.embedded()[0].optional);
}

#[test]
fn test_optional_embeddings_are_allocated_on_the_way_down() {
    let req = get("/nested/5").with_path_param("id", "5");
    let nested: Nested = bind(&req, &BindConfig::default()).unwrap();
    assert_eq!(nested.id, 5);
    let paging = nested.paging.unwrap();
    assert_eq!(paging.size, 10);
    assert_eq!(paging.trace, Some(Trace { trace_id: "none".into() }));
}

#[derive(Debug, Default, Bind)]
struct Loop {
    #[bind(in = "query", name = "x,omitempty")]
    x: String,
    #[bind(flatten)]
    again: Option<Box<Loop>>,
}

#[test]
fn test_recursive_embedding_is_a_configuration_error() {
    let err = descriptor::describe(Loop::type_info()).unwrap_err();
    assert!(matches!(err, ConfigError::RecursiveEmbedding { .. }));

    let err = bind::<Loop>(&get("/loop"), &BindConfig::default()).unwrap_err();
    assert_eq!(err.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
}

#[derive(Debug, Default, Bind)]
struct BadDefault {
    #[bind(in = "query", name = "size,omitempty", default = "ten")]
    size: u32,
}

#[test]
fn test_invalid_default_literal_is_fatal() {
    let err = descriptor::describe(BadDefault::type_info()).unwrap_err();
    assert_eq!(
        err,
        ConfigError::InvalidDefault {
            name: "size".into(),
            value: "ten".into()
        }
    );
    assert!(matches!(
        bind::<BadDefault>(&get("/?size=3"), &BindConfig::default()),
        Err(BindError::Config(_))
    ));
}

#[derive(Debug, Default, Bind)]
struct Unsupported {
    #[bind(in = "query", name = "meta,omitempty")]
    meta: HashMap<String, String>,
}

#[test]
fn test_unsupported_field_type() {
    // absent optional values never reach conversion
    assert!(bind::<Unsupported>(&get("/"), &BindConfig::default()).is_ok());

    let err = bind::<Unsupported>(&get("/?meta=a"), &BindConfig::default()).unwrap_err();
    assert!(err.to_string().starts_with("unsupported parameter type"), "{err}");
}

#[derive(Debug, Default, PartialEq, Deserialize, Bind)]
#[serde(default)]
struct Payload {
    #[bind(json = "name")]
    name: String,
    #[bind(json = "kind,omitempty", default = "basic")]
    kind: String,
}

#[derive(Debug, Default, PartialEq, Bind)]
struct CreateItem {
    #[bind(in = "body")]
    body: Option<Payload>,
}

#[test]
fn test_json_body_decodes_first_value() {
    let req = json("/items", r#"{"name": "lamp"} trailing"#);
    let item: CreateItem = bind(&req, &BindConfig::default()).unwrap();
    assert_eq!(item.body, Some(Payload { name: "lamp".into(), kind: String::new() }));
}

#[test]
fn test_json_body_validation_toggle() {
    let config = BindConfig::default();
    config.set_validate_json_body(true);

    let item: CreateItem = bind(&json("/items", r#"{"name": "lamp"}"#), &config).unwrap();
    assert_eq!(item.body.unwrap().kind, "basic");

    let err = bind::<CreateItem>(&json("/items", "{}"), &config).unwrap_err();
    assert_eq!(err.to_string(), "missing required field 'name' in body");

    config.set_validate_json_body(false);
    assert!(bind::<CreateItem>(&json("/items", "{}"), &config).is_ok());
}

#[test]
fn test_invalid_json_body() {
    let err = bind::<CreateItem>(&json("/items", "[1, 2"), &BindConfig::default()).unwrap_err();
    assert!(err.to_string().starts_with("invalid body parameter: parse json failed"), "{err}");
}

#[derive(Debug, Default, PartialEq, Bind)]
struct Attachments {
    #[bind(name = "doc")]
    doc: Option<FileHeader>,
    #[bind(name = "extra,omitempty")]
    extra: Vec<FileHeader>,
    #[bind(name = "note,omitempty", default = "n/a")]
    note: String,
    #[bind(name = "label")]
    labels: Vec<String>,
}

#[derive(Debug, Default, PartialEq, Bind)]
struct Upload {
    #[bind(in = "body", mime = "multipart")]
    body: Attachments,
}

#[test]
fn test_multipart_files_and_values() {
    let req = multipart(
        "/upload",
        &[
            ("doc", Some("a.pdf"), "%PDF"),
            ("doc", Some("b.pdf"), "ignored"),
            ("label", None, "x"),
            ("label", None, ""),
            ("label", None, "y"),
        ],
    );
    let upload: Upload = bind(&req, &BindConfig::default()).unwrap();
    let doc = upload.body.doc.unwrap();
    assert_eq!(doc.filename, "a.pdf");
    assert_eq!(doc.size, 4);
    assert!(upload.body.extra.is_empty());
    assert_eq!(upload.body.note, "n/a");
    assert_eq!(upload.body.labels, vec!["x".to_string(), "y".to_string()]);
}

#[test]
fn test_multipart_required_parts() {
    let req = multipart("/upload", &[("label", None, "x")]);
    let err = bind::<Upload>(&req, &BindConfig::default()).unwrap_err();
    assert_eq!(err.to_string(), "missing required file 'doc' in form");

    let req = multipart("/upload", &[("doc", Some("a.pdf"), "%PDF")]);
    let err = bind::<Upload>(&req, &BindConfig::default()).unwrap_err();
    assert_eq!(
        err,
        BindError::MissingParameter {
            name: "label".into(),
            location: Location::Form
        }
    );
}

#[test]
fn test_empty_file_inputs_are_not_files() {
    let req = multipart(
        "/upload",
        &[("doc", Some("a.pdf"), "%PDF"), ("extra", Some(""), ""), ("label", None, "x")],
    );
    let upload: Upload = bind(&req, &BindConfig::default()).unwrap();
    assert!(upload.body.extra.is_empty());

    let req = multipart("/upload", &[("doc", Some(""), ""), ("label", None, "x")]);
    let err = bind::<Upload>(&req, &BindConfig::default()).unwrap_err();
    assert_eq!(
        err,
        BindError::MissingFile {
            name: "doc".into(),
            multiple: false
        }
    );
}

#[derive(Debug, Default, Bind)]
#[bind(generated)]
struct HandWritten {
    #[bind(in = "query", name = "n")]
    n: i32,
}

impl BindParameters for HandWritten {
    fn bind_parameters(&mut self, req: &dyn RequestParts, _config: &BindConfig) -> Result<(), BindError> {
        self.n = req.query("n").map(str::len).unwrap_or_default() as i32;
        Ok(())
    }
}

#[test]
fn test_override_replaces_reflective_binding() {
    let req = get("/?n=abcd");
    let bound: HandWritten = bind(&req, &BindConfig::default()).unwrap();
    assert_eq!(bound.n, 4);

    let mut reflective = HandWritten::default();
    assert!(bind_reflective(&mut reflective, &req, &BindConfig::default()).is_err());
}

#[test]
fn test_concurrent_binding_shares_descriptors() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            thread::spawn(move || {
                let req = get(&format!("/items?item_id=t{i}&count={i}"));
                bind::<ListItems>(&req, &BindConfig::default()).unwrap()
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let items = handle.join().unwrap();
        assert_eq!(items.item_id, format!("t{i}"));
        assert_eq!(items.count, i as i32);
    }
    assert!(descriptor::cached_types() >= 1);
}
