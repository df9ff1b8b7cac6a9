//! Route declarations of the user service.

pub mod file;
pub mod middleware;
pub mod user;

use reqbind::openapi::OpenApiDocument;
use reqbind::{Liveness, RouterGroup};

/// The full route tree: `/liveness` plus everything under `/server`.
pub fn router() -> Vec<RouterGroup> {
    let mut root = RouterGroup::new("/");
    root.register_api(Liveness::new("/liveness"));

    let mut server = RouterGroup::new("/server");
    server.register_api(OpenApiDocument::new("", "openapi.json"));
    server.register_group(file::router());
    server.register_group(user::router());
    root.register_group(server);

    vec![root]
}
