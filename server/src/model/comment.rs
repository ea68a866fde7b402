use crate::model::post::Post;
use crate::model::user::User;
use crate::schema::comment;
use crate::time::DateTime;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

#[derive(Insertable)]
#[diesel(table_name = comment)]
#[diesel(check_for_backend(Sqlite))]
pub struct NewComment<'a> {
    pub post_id: i64,
    pub user_id: i64,
    pub text: &'a str,
    pub creation_time: DateTime,
}

#[derive(Debug, Associations, Identifiable, Queryable, Selectable)]
#[diesel(belongs_to(Post))]
#[diesel(belongs_to(User))]
#[diesel(table_name = comment)]
#[diesel(check_for_backend(Sqlite))]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub text: String,
    pub creation_time: DateTime,
}
