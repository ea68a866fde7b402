use crate::model::follow;
use crate::model::user::User;
use crate::schema::{follow as follow_table, post, user};
use crate::string::SmallString;
use diesel::prelude::*;
use serde::Serialize;

/// An author as shown on their profile and beside their posts.
#[derive(Debug, Serialize)]
pub struct ProfileInfo {
    pub id: i64,
    pub name: SmallString,
    pub joined: String,
    pub post_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
}

impl ProfileInfo {
    pub fn new(conn: &mut SqliteConnection, user: User) -> QueryResult<Self> {
        let post_count = post::table.filter(post::user_id.eq(user.id)).count().get_result(conn)?;
        let follower_count = follow_table::table
            .filter(follow_table::author_id.eq(user.id))
            .count()
            .get_result(conn)?;
        let following_count = follow_table::table
            .filter(follow_table::user_id.eq(user.id))
            .count()
            .get_result(conn)?;
        Ok(Self {
            id: user.id,
            joined: user.creation_time.display(),
            name: user.name,
            post_count,
            follower_count,
            following_count,
        })
    }

    /// Whether `client_id` follows this author. Anonymous clients follow no one.
    pub fn followed_by(&self, conn: &mut SqliteConnection, client_id: Option<i64>) -> QueryResult<bool> {
        match client_id {
            Some(client_id) => follow::is_following(conn, client_id, self.id),
            None => Ok(false),
        }
    }
}

pub fn by_name(conn: &mut SqliteConnection, name: &str) -> QueryResult<Option<User>> {
    user::table
        .select(User::as_select())
        .filter(user::name.eq(name))
        .first(conn)
        .optional()
}
