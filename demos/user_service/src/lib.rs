//! Example service: user management endpoints declared with reqbind.
//!
//! `build.rs` generates the binding code for every API into `OUT_DIR`; the
//! request types pick it up through `#[bind(generated)]`.

pub mod apis;
