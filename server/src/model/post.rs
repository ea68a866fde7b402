use crate::model::group::Group;
use crate::model::user::User;
use crate::schema::post;
use crate::time::DateTime;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

#[derive(Insertable)]
#[diesel(table_name = post)]
#[diesel(check_for_backend(Sqlite))]
pub struct NewPost<'a> {
    pub text: &'a str,
    pub creation_time: DateTime,
    pub user_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<&'a str>,
}

#[derive(Debug, Clone, Associations, Identifiable, Queryable, Selectable)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Group))]
#[diesel(table_name = post)]
#[diesel(check_for_backend(Sqlite))]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub creation_time: DateTime,
    pub user_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl Post {
    /// Short form of the post used in listings and logs: its first 15 characters.
    pub fn short_text(&self) -> &str {
        short_text(&self.text)
    }
}

/// Fields of a post that its author may edit.
#[derive(AsChangeset)]
#[diesel(table_name = post)]
#[diesel(treat_none_as_null = true)]
pub struct PostChanges<'a> {
    pub text: &'a str,
    pub group_id: Option<i64>,
    pub image: Option<&'a str>,
}

pub const SHORT_TEXT_LENGTH: usize = 15;

pub fn short_text(text: &str) -> &str {
    match text.char_indices().nth(SHORT_TEXT_LENGTH) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
