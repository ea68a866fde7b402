use crate::model::comment::Comment;
use crate::schema::{comment, user};
use crate::string::SmallString;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CommentInfo {
    pub id: i64,
    pub author: SmallString,
    pub text: String,
    pub pub_date: String,
}

impl CommentInfo {
    /// Loads all comments on a post, oldest first.
    pub fn all_for_post(conn: &mut SqliteConnection, post_id: i64) -> QueryResult<Vec<Self>> {
        let comments: Vec<(Comment, SmallString)> = comment::table
            .inner_join(user::table)
            .select((Comment::as_select(), user::name))
            .filter(comment::post_id.eq(post_id))
            .order((comment::creation_time.asc(), comment::id.asc()))
            .load(conn)?;
        Ok(comments
            .into_iter()
            .map(|(comment, author)| Self {
                id: comment.id,
                author,
                pub_date: comment.creation_time.display(),
                text: comment.text,
            })
            .collect())
    }
}
