use clap::Parser;
use http::Method;
use reqbind::cli::{run_cli, Cli, Outcome};
use reqbind::logging::{init_logging, LogFormat};
use reqbind::{BindConfig, BindRequest, Endpoint};
use tracing::{info, warn};
use user_service::apis;

fn dispatch(endpoint: &Endpoint, req: &BindRequest, config: &BindConfig) {
    match endpoint.handle(req, config) {
        Ok(body) => println!("✅ {} {} → {}", endpoint.method, endpoint.path, body),
        Err(err) => {
            warn!(path = %endpoint.path, code = err.code, msg = %err.msg, "Request rejected");
            println!("❌ {} {} → {} {}", endpoint.method, endpoint.path, err.code, err.msg);
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_logging(LogFormat::from_env())?;

    let groups = apis::router();
    if run_cli(Cli::parse(), &groups)? == Outcome::Exit {
        return Ok(());
    }

    let endpoints: Vec<Endpoint> = groups.iter().flat_map(|group| group.endpoints()).collect();
    for endpoint in &endpoints {
        info!(
            method = %endpoint.method,
            path = %endpoint.path,
            type_name = endpoint.api.type_info().name,
            "Route registered"
        );
    }

    let config = BindConfig::from_env();
    let samples: [(Method, &str, &str, &[(&str, &str)]); 5] = [
        (Method::GET, "/server/user/:id", "/server/user/42?auth_token=t", &[("id", "42")]),
        (Method::GET, "/server/user/me", "/server/user/me?auth_token=ann", &[]),
        (Method::GET, "/server/user", "/server/user?page=2&tag=a&tag=b", &[]),
        (Method::GET, "/server/user/sub", "/server/user/sub?offset=5&auth_token=t", &[]),
        (Method::GET, "/server/file/:name", "/server/file/report.pdf?inline=true", &[("name", "report.pdf")]),
    ];
    for (method, pattern, uri, params) in samples {
        let Some(endpoint) = endpoints.iter().find(|e| e.method == method && e.path == pattern) else {
            warn!(%method, pattern, "No route registered");
            continue;
        };
        let http_req = http::Request::builder()
            .method(method)
            .uri(uri)
            .header("X-Tenant", "acme")
            .body(Vec::new())?;
        let mut req = BindRequest::from_http(http_req);
        for (name, value) in params {
            req = req.with_path_param(name, *value);
        }
        dispatch(endpoint, &req, &config);
    }
    Ok(())
}
