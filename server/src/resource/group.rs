use crate::model::group::Group;
use crate::resource;
use crate::schema::{group, post};
use crate::string::SmallString;
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct GroupInfo {
    pub id: i64,
    pub title: String,
    pub slug: SmallString,
    pub description: String,
    pub post_count: i64,
}

impl GroupInfo {
    /// Loads every group ordered by title, along with how many posts each contains.
    pub fn all(conn: &mut SqliteConnection) -> QueryResult<Vec<Self>> {
        let groups = all_groups(conn)?;
        let post_counts: Vec<(Option<i64>, i64)> = post::table
            .filter(post::group_id.is_not_null())
            .group_by(post::group_id)
            .select((post::group_id, count_star()))
            .load(conn)?;
        let post_counts: Vec<(i64, i64)> = post_counts
            .into_iter()
            .filter_map(|(group_id, count)| group_id.map(|id| (id, count)))
            .collect();

        Ok(groups
            .into_iter()
            .map(|group| Self {
                post_count: resource::count_for(&post_counts, group.id),
                id: group.id,
                title: group.title,
                slug: group.slug,
                description: group.description,
            })
            .collect())
    }
}

/// Groups in the order they are offered to post authors.
pub fn all_groups(conn: &mut SqliteConnection) -> QueryResult<Vec<Group>> {
    group::table
        .select(Group::as_select())
        .order((group::title.asc(), group::id.asc()))
        .load(conn)
}

pub fn by_slug(conn: &mut SqliteConnection, slug: &str) -> QueryResult<Option<Group>> {
    group::table
        .select(Group::as_select())
        .filter(group::slug.eq(slug))
        .first(conn)
        .optional()
}
