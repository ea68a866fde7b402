pub mod header;
pub mod password;
pub mod session;

use crate::string::SmallString;
use serde::Serialize;

/// The user on whose behalf a request is made. Anonymous clients have neither id nor name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Client {
    pub id: Option<i64>,
    pub name: Option<SmallString>,
}

impl Client {
    pub fn new(id: i64, name: SmallString) -> Self {
        Self {
            id: Some(id),
            name: Some(name),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}
