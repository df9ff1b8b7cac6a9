use http::Method;
use reqbind::{Api, Bind, Context, Operation, Responses, RouterGroup};
use serde::Serialize;

#[cfg(reqbind_generated)]
mod zz_reqbind_generated {
    include!(concat!(env!("OUT_DIR"), "/apis/file/zz_reqbind_generated.rs"));
}

pub fn router() -> RouterGroup {
    let mut group = RouterGroup::new("/file");
    group.register_api(Download::default());
    group
}

#[derive(Debug, Default, PartialEq, Bind)]
#[cfg_attr(reqbind_generated, bind(generated))]
pub struct Download {
    #[bind(in = "path", name = "name", desc = "File name")]
    pub name: String,
    #[bind(in = "query", name = "inline,omitempty", desc = "Render in the browser instead of downloading")]
    pub inline: bool,
}

#[derive(Debug, Default, Serialize, Bind)]
pub struct FileLink {
    #[bind(json = "url")]
    pub url: String,
    #[bind(json = "disposition")]
    pub disposition: String,
}

impl Operation for Download {
    type Output = FileLink;

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<FileLink> {
        let disposition = if self.inline { "inline" } else { "attachment" };
        Ok(FileLink {
            url: format!("/static/{}", self.name),
            disposition: disposition.to_string(),
        })
    }
}

impl Api for Download {
    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> String {
        "/:name".to_string()
    }

    fn summary(&self) -> &str {
        "Download a file"
    }

    fn responses(&self) -> Responses {
        Responses::new().with::<FileLink>(200)
    }
}
