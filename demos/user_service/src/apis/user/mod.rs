//! User management endpoints, all behind [`MustAuth`].

pub mod sub;

use chrono::{DateTime, Utc};
use http::Method;
use reqbind::{Api, Bind, Context, FileHeader, HttpError, Operation, Responses, RouterGroup};
use serde::{Deserialize, Serialize};

use super::middleware::MustAuth;

#[cfg(reqbind_generated)]
mod zz_reqbind_generated {
    include!(concat!(env!("OUT_DIR"), "/apis/user/zz_reqbind_generated.rs"));
}

pub fn router() -> RouterGroup {
    let mut group = RouterGroup::new("/user").with_middleware(MustAuth::default());
    group
        .register_api(GetMe::default())
        .register_api(GetUser::default())
        .register_api(ListUser::default())
        .register_api(CreateUser::default())
        .register_api(UpdateUser::default())
        .register_api(UploadFile::default());
    group.register_group(sub::router());
    group
}

/// A user as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Bind)]
#[serde(rename_all = "camelCase")]
pub struct RespUser {
    #[bind(json = "id", desc = "User ID")]
    pub id: u64,
    #[bind(json = "userName", desc = "User name")]
    pub user_name: String,
    #[bind(json = "role")]
    pub role: String,
    #[bind(json = "createdAt,omitempty")]
    pub created_at: Option<DateTime<Utc>>,
    #[bind(json = "friends,omitempty", desc = "Users this user follows")]
    pub friends: Vec<RespUser>,
}

#[derive(Debug, Default, PartialEq, Bind)]
#[cfg_attr(reqbind_generated, bind(generated))]
pub struct GetUser {
    #[bind(in = "path", name = "id", desc = "User ID")]
    pub id: u64,
    #[bind(in = "header", name = "X-Request-Id,omitempty")]
    pub request_id: Option<String>,
}

impl Operation for GetUser {
    type Output = RespUser;

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<RespUser> {
        if self.id == 0 {
            return Err(HttpError::new(404, "user not found", format!("id {}", self.id)).into());
        }
        Ok(RespUser {
            id: self.id,
            user_name: format!("user-{}", self.id),
            role: "member".to_string(),
            ..RespUser::default()
        })
    }
}

impl Api for GetUser {
    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> String {
        "/:id".to_string()
    }

    fn summary(&self) -> &str {
        "Get a user by ID"
    }

    fn responses(&self) -> Responses {
        Responses::new().with::<RespUser>(200).with::<HttpError>(404)
    }
}

/// The authenticated caller, as identified by [`MustAuth`].
#[derive(Debug, Default, PartialEq, Bind)]
#[cfg_attr(reqbind_generated, bind(generated))]
pub struct GetMe {
    #[bind(in = "query", name = "role,omitempty", default = "member")]
    pub role: String,
}

impl Operation for GetMe {
    type Output = RespUser;

    fn output(&self, ctx: &Context<'_>) -> anyhow::Result<RespUser> {
        let principal = ctx
            .middleware_output::<MustAuth>()
            .ok_or_else(|| HttpError::new(401, "Unauthorized", "no authenticated caller"))?;
        Ok(RespUser {
            user_name: principal.subject.clone(),
            role: self.role.clone(),
            ..RespUser::default()
        })
    }
}

impl Api for GetMe {
    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> String {
        "/me".to_string()
    }

    fn summary(&self) -> &str {
        "Get the authenticated user"
    }

    fn responses(&self) -> Responses {
        Responses::new().with::<RespUser>(200).with::<HttpError>(401)
    }
}

#[derive(Debug, Default, PartialEq, Bind)]
#[cfg_attr(reqbind_generated, bind(generated))]
pub struct ListUser {
    #[bind(in = "query", name = "page,omitempty", default = "1", desc = "Page number")]
    pub page: u32,
    #[bind(in = "query", name = "size,omitempty", default = "20", desc = "Page size")]
    pub size: u32,
    #[bind(in = "query", name = "tag,omitempty")]
    pub tags: Vec<String>,
    #[bind(in = "query", name = "since,omitempty", desc = "Only users created after this instant")]
    pub since: Option<DateTime<Utc>>,
    #[bind(in = "header", name = "X-Tenant")]
    pub tenant: String,
}

impl Operation for ListUser {
    type Output = Vec<RespUser>;

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<Vec<RespUser>> {
        let first = u64::from(self.page.saturating_sub(1)) * u64::from(self.size);
        Ok((first + 1..=first + u64::from(self.size.min(3)))
            .map(|id| RespUser {
                id,
                user_name: format!("{}-user-{id}", self.tenant),
                role: "member".to_string(),
                created_at: self.since,
                friends: Vec::new(),
            })
            .collect())
    }
}

impl Api for ListUser {
    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> String {
        "/".to_string()
    }

    fn summary(&self) -> &str {
        "List users"
    }

    fn responses(&self) -> Responses {
        Responses::new().with::<Vec<RespUser>>(200)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Bind)]
#[serde(default)]
pub struct Address {
    #[bind(json = "street")]
    pub street: String,
    #[bind(json = "city,omitempty", default = "Berlin")]
    pub city: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Bind)]
#[serde(default, rename_all = "camelCase")]
pub struct ReqCreateUser {
    #[bind(json = "userName", desc = "User name")]
    pub user_name: String,
    #[bind(json = "age,omitempty")]
    pub age: u8,
    #[bind(json = "role,omitempty", default = "member", desc = "Defaults to member")]
    pub role: String,
    #[bind(json = "address,omitempty")]
    pub address: Option<Address>,
}

#[derive(Debug, Default, PartialEq, Bind)]
#[cfg_attr(reqbind_generated, bind(generated))]
pub struct CreateUser {
    #[bind(in = "body", desc = "User to create")]
    pub body: ReqCreateUser,
}

impl Operation for CreateUser {
    type Output = RespUser;

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<RespUser> {
        Ok(RespUser {
            id: 1,
            user_name: self.body.user_name.clone(),
            role: self.body.role.clone(),
            created_at: Some(Utc::now()),
            friends: Vec::new(),
        })
    }
}

impl Api for CreateUser {
    fn method(&self) -> Method {
        Method::POST
    }

    fn path(&self) -> String {
        "/".to_string()
    }

    fn summary(&self) -> &str {
        "Create a user"
    }

    fn responses(&self) -> Responses {
        Responses::new().with::<RespUser>(201)
    }
}

/// Sampling controls shared by write endpoints.
#[derive(Debug, Clone, Default, PartialEq, Bind)]
pub struct Sampling {
    #[bind(in = "query", name = "sample,omitempty", default = "0.5", desc = "Trace sampling rate")]
    pub rate: f64,
}

/// Request tracing headers.
#[derive(Debug, Clone, Default, PartialEq, Bind)]
pub struct Tracing {
    #[bind(in = "header", name = "X-Trace-Id,omitempty")]
    pub trace_id: String,
    #[bind(flatten)]
    pub sampling: Option<Sampling>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Bind)]
#[serde(default)]
pub struct ReqUpdateUser {
    #[bind(json = "value")]
    pub value: String,
}

#[derive(Debug, Default, PartialEq, Bind)]
#[cfg_attr(reqbind_generated, bind(generated))]
pub struct UpdateUser {
    #[bind(in = "path", name = "id", desc = "User ID")]
    pub id: u64,
    #[bind(flatten)]
    pub tracing: Option<Box<Tracing>>,
    #[bind(in = "body")]
    pub body: Option<ReqUpdateUser>,
}

impl Operation for UpdateUser {
    type Output = RespUser;

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<RespUser> {
        let role = self.body.as_ref().map(|body| body.value.clone()).unwrap_or_default();
        Ok(RespUser {
            id: self.id,
            user_name: format!("user-{}", self.id),
            role,
            ..RespUser::default()
        })
    }
}

impl Api for UpdateUser {
    fn method(&self) -> Method {
        Method::PUT
    }

    fn path(&self) -> String {
        "/:id".to_string()
    }

    fn summary(&self) -> &str {
        "Update a user's role"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Bind)]
pub struct ReqUploadFile {
    #[bind(name = "file", desc = "Avatar image")]
    pub file: FileHeader,
    #[bind(name = "images,omitempty")]
    pub images: Vec<FileHeader>,
    #[bind(name = "title,omitempty", default = "untitled")]
    pub title: String,
    #[bind(name = "tags,omitempty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Bind)]
pub struct RespUpload {
    #[bind(json = "filename")]
    pub filename: String,
    #[bind(json = "size")]
    pub size: u64,
    #[bind(json = "images")]
    pub images: u64,
    #[bind(json = "title")]
    pub title: String,
}

#[derive(Debug, Default, PartialEq, Bind)]
#[cfg_attr(reqbind_generated, bind(generated))]
pub struct UploadFile {
    #[bind(in = "body", mime = "multipart")]
    pub body: Option<Box<ReqUploadFile>>,
}

impl Operation for UploadFile {
    type Output = RespUpload;

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<RespUpload> {
        let body = self
            .body
            .as_deref()
            .ok_or_else(|| HttpError::new(400, "missing upload", ""))?;
        Ok(RespUpload {
            filename: body.file.filename.clone(),
            size: body.file.size,
            images: body.images.len() as u64,
            title: body.title.clone(),
        })
    }
}

impl Api for UploadFile {
    fn method(&self) -> Method {
        Method::POST
    }

    fn path(&self) -> String {
        "/avatar".to_string()
    }

    fn summary(&self) -> &str {
        "Upload an avatar"
    }

    fn responses(&self) -> Responses {
        Responses::new().with::<RespUpload>(200)
    }
}
