use reqbind::{Bind, Context, HttpError, Middleware, Operation};
use serde::Serialize;

#[cfg(reqbind_generated)]
mod zz_reqbind_generated {
    include!(concat!(env!("OUT_DIR"), "/apis/middleware/zz_reqbind_generated.rs"));
}

/// Rejects requests that carry neither a bearer token nor an `auth_token`
/// query parameter.
#[derive(Debug, Default, PartialEq, Bind)]
#[cfg_attr(reqbind_generated, bind(generated))]
pub struct MustAuth {
    #[bind(in = "header", name = "Authorization,omitempty", desc = "Bearer token")]
    pub authorization: String,
    #[bind(in = "query", name = "auth_token,omitempty", desc = "Token for clients that cannot set headers")]
    pub auth_token: Option<String>,
}

impl MustAuth {
    fn token(&self) -> Option<&str> {
        self.authorization
            .strip_prefix("Bearer ")
            .or(self.auth_token.as_deref())
            .filter(|token| !token.is_empty())
    }
}

/// The caller identified by [`MustAuth`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    pub subject: String,
}

impl Operation for MustAuth {
    type Output = Principal;

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<Principal> {
        match self.token() {
            Some(token) => Ok(Principal {
                subject: token.to_string(),
            }),
            None => Err(HttpError::new(401, "Unauthorized", "missing bearer token").into()),
        }
    }
}

impl Middleware for MustAuth {}
