use http::Method;
use reqbind::{Api, Bind, Context, Operation, RouterGroup};

#[cfg(reqbind_generated)]
mod zz_reqbind_generated {
    include!(concat!(env!("OUT_DIR"), "/apis/user/sub/zz_reqbind_generated.rs"));
}

pub fn router() -> RouterGroup {
    let mut group = RouterGroup::new("/sub");
    group.register_api(ListSub::default());
    group
}

/// Pages through the IDs of a user's sub-accounts.
#[derive(Debug, Default, PartialEq, Bind)]
#[cfg_attr(reqbind_generated, bind(generated))]
pub struct ListSub {
    #[bind(in = "query", name = "size,omitempty", default = "10")]
    pub size: i64,
    #[bind(in = "query", name = "offset,omitempty", default = "0")]
    pub offset: i64,
}

impl Operation for ListSub {
    type Output = Vec<i64>;

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<Vec<i64>> {
        Ok((self.offset..self.offset + self.size).collect())
    }
}

impl Api for ListSub {
    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> String {
        "/".to_string()
    }
}
