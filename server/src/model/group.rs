use crate::schema::group;
use crate::string::SmallString;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use serde::Serialize;
use std::fmt::Display;

#[derive(Insertable)]
#[diesel(table_name = group)]
#[diesel(check_for_backend(Sqlite))]
pub struct NewGroup<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Serialize)]
#[diesel(table_name = group)]
#[diesel(check_for_backend(Sqlite))]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: SmallString,
    pub description: String,
}

impl Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_SLUG_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 400;
