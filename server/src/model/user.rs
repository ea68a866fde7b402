use crate::schema::{user, user_session};
use crate::string::SmallString;
use crate::time::DateTime;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

#[derive(Insertable)]
#[diesel(table_name = user)]
#[diesel(check_for_backend(Sqlite))]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub password_hash: &'a str,
    pub creation_time: DateTime,
    pub last_login_time: DateTime,
}

impl<'a> NewUser<'a> {
    pub fn new(name: &'a str, password_hash: &'a str) -> Self {
        let now = DateTime::now();
        Self {
            name,
            password_hash,
            creation_time: now,
            last_login_time: now,
        }
    }
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = user)]
#[diesel(check_for_backend(Sqlite))]
pub struct User {
    pub id: i64,
    pub name: SmallString,
    pub password_hash: String,
    pub creation_time: DateTime,
    pub last_login_time: DateTime,
}

#[derive(Insertable)]
#[diesel(table_name = user_session)]
#[diesel(check_for_backend(Sqlite))]
pub struct NewUserSession<'a> {
    pub id: &'a str,
    pub user_id: i64,
    pub creation_time: DateTime,
    pub expiration_time: DateTime,
}
