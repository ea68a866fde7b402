use crate::schema::follow;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

#[derive(Insertable)]
#[diesel(table_name = follow)]
#[diesel(check_for_backend(Sqlite))]
pub struct NewFollow {
    pub user_id: i64,
    pub author_id: i64,
}

/// Subscribes `user_id` to `author_id`. Does nothing if the subscription already exists.
/// Returns whether a new row was created.
pub fn follow(conn: &mut SqliteConnection, user_id: i64, author_id: i64) -> QueryResult<bool> {
    diesel::insert_or_ignore_into(follow::table)
        .values(NewFollow { user_id, author_id })
        .execute(conn)
        .map(|inserted| inserted > 0)
}

/// Removes subscription of `user_id` to `author_id`, if any. Returns whether a row was deleted.
pub fn unfollow(conn: &mut SqliteConnection, user_id: i64, author_id: i64) -> QueryResult<bool> {
    diesel::delete(follow::table)
        .filter(follow::user_id.eq(user_id))
        .filter(follow::author_id.eq(author_id))
        .execute(conn)
        .map(|deleted| deleted > 0)
}

pub fn is_following(conn: &mut SqliteConnection, user_id: i64, author_id: i64) -> QueryResult<bool> {
    diesel::select(exists(
        follow::table
            .filter(follow::user_id.eq(user_id))
            .filter(follow::author_id.eq(author_id)),
    ))
    .get_result(conn)
}
