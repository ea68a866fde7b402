use crate::config::Config;
use crate::model::group::Group;
use crate::model::post::{self, Post};
use crate::pagination::{Page, Paginator};
use crate::resource;
use crate::schema::{comment, follow, group, post as post_table, user};
use crate::string::SmallString;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use serde::Serialize;

/// Selects which posts a listing shows.
#[derive(Debug, Clone, Copy)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts of every author the given user follows.
    FollowedBy(i64),
}

impl PostFilter {
    fn query(self) -> post_table::BoxedQuery<'static, Sqlite> {
        let query = post_table::table.into_boxed();
        match self {
            Self::All => query,
            Self::Group(group_id) => query.filter(post_table::group_id.eq(group_id)),
            Self::Author(user_id) => query.filter(post_table::user_id.eq(user_id)),
            Self::FollowedBy(user_id) => {
                let authors = follow::table.select(follow::author_id).filter(follow::user_id.eq(user_id));
                query.filter(post_table::user_id.eq_any(authors))
            }
        }
    }
}

/// A post as rendered on listings and on its own page.
#[derive(Debug, Serialize)]
pub struct PostInfo {
    pub id: i64,
    pub text: String,
    pub short_text: String,
    pub pub_date: String,
    pub author: SmallString,
    pub group: Option<Group>,
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub comment_count: i64,
}

impl PostInfo {
    fn new(config: &Config, post: Post, author: SmallString, group: Option<Group>, comment_count: i64) -> Self {
        Self {
            id: post.id,
            short_text: post::short_text(&post.text).to_owned(),
            pub_date: post.creation_time.display(),
            author,
            group,
            image_url: post.image.as_deref().map(|image| config.media_url(image)),
            image: post.image,
            text: post.text,
            comment_count,
        }
    }

    /// Loads info for the post with id `post_id` if it was written by `username`.
    pub fn by_author(
        conn: &mut SqliteConnection,
        config: &Config,
        username: &str,
        post_id: i64,
    ) -> QueryResult<Option<Self>> {
        let post_id: Option<i64> = post_table::table
            .inner_join(user::table)
            .select(post_table::id)
            .filter(post_table::id.eq(post_id))
            .filter(user::name.eq(username))
            .first(conn)
            .optional()?;
        match post_id {
            Some(id) => Self::new_batch_from_ids(conn, config, &[id]).map(|mut batch| batch.pop()),
            None => Ok(None),
        }
    }

    /// Loads infos for the posts in `post_ids`, newest first.
    pub fn new_batch_from_ids(conn: &mut SqliteConnection, config: &Config, post_ids: &[i64]) -> QueryResult<Vec<Self>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let posts: Vec<(Post, SmallString, Option<Group>)> = post_table::table
            .inner_join(user::table)
            .left_join(group::table)
            .select((Post::as_select(), user::name, group::all_columns.nullable()))
            .filter(post_table::id.eq_any(post_ids))
            .order((post_table::creation_time.desc(), post_table::id.desc()))
            .load(conn)?;
        let comment_counts: Vec<(i64, i64)> = comment::table
            .filter(comment::post_id.eq_any(post_ids))
            .group_by(comment::post_id)
            .select((comment::post_id, count_star()))
            .load(conn)?;

        Ok(posts
            .into_iter()
            .map(|(post, author, group)| {
                let comment_count = resource::count_for(&comment_counts, post.id);
                Self::new(config, post, author, group, comment_count)
            })
            .collect())
    }
}

/// Total number of posts matching `filter`.
pub fn count(conn: &mut SqliteConnection, filter: PostFilter) -> QueryResult<i64> {
    filter.query().count().get_result(conn)
}

/// Loads one page of posts matching `filter`, newest first. `requested_page` is the raw
/// page number from the query string.
pub fn load_page(
    conn: &mut SqliteConnection,
    config: &Config,
    filter: PostFilter,
    per_page: i64,
    requested_page: Option<&str>,
) -> QueryResult<Page<PostInfo>> {
    let paginator = Paginator::new(count(conn, filter)?, per_page);
    let number = paginator.page_number(requested_page);
    let post_ids: Vec<i64> = filter
        .query()
        .select(post_table::id)
        .order((post_table::creation_time.desc(), post_table::id.desc()))
        .offset(paginator.offset(number))
        .limit(paginator.per_page())
        .load(conn)?;
    let posts = PostInfo::new_batch_from_ids(conn, config, &post_ids)?;
    Ok(paginator.page(number, posts))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::follow;
    use crate::test::*;

    #[test]
    fn filters() -> QueryResult<()> {
        let state = test_state();
        let mut conn = state.get_connection().unwrap_or_else(|err| panic!("{err}"));
        let author = create_test_user(&mut conn, &state.config, "author")?;
        let reader = create_test_user(&mut conn, &state.config, "reader")?;
        let group = create_test_group(&mut conn, "test-group")?;

        create_test_post(&mut conn, &author, Some(&group), "Group post")?;
        create_test_post(&mut conn, &author, None, "Post without group")?;
        create_test_post(&mut conn, &reader, None, "Post by reader")?;

        assert_eq!(count(&mut conn, PostFilter::All)?, 3);
        assert_eq!(count(&mut conn, PostFilter::Group(group.id))?, 1);
        assert_eq!(count(&mut conn, PostFilter::Author(author.id))?, 2);
        assert_eq!(count(&mut conn, PostFilter::FollowedBy(reader.id))?, 0);

        follow::follow(&mut conn, reader.id, author.id)?;
        assert_eq!(count(&mut conn, PostFilter::FollowedBy(reader.id))?, 2);
        assert_eq!(count(&mut conn, PostFilter::FollowedBy(author.id))?, 0);
        Ok(())
    }

    #[test]
    fn pages() -> QueryResult<()> {
        let state = test_state();
        let mut conn = state.get_connection().unwrap_or_else(|err| panic!("{err}"));
        let author = create_test_user(&mut conn, &state.config, TEST_USERNAME)?;
        for index in 0..13 {
            create_test_post(&mut conn, &author, None, &format!("Test post {index}"))?;
        }

        let first = load_page(&mut conn, &state.config, PostFilter::All, 10, None)?;
        assert_eq!(first.object_list.len(), 10);
        assert_eq!(first.num_pages, 2);
        assert_eq!(first.object_list[0].text, "Test post 12");

        let second = load_page(&mut conn, &state.config, PostFilter::All, 10, Some("2"))?;
        assert_eq!(second.object_list.len(), 3);
        assert_eq!(second.object_list[2].text, "Test post 0");

        let out_of_range = load_page(&mut conn, &state.config, PostFilter::All, 10, Some("99"))?;
        assert_eq!(out_of_range.number, 2);

        let empty = load_page(&mut conn, &state.config, PostFilter::Author(author.id + 1), 10, None)?;
        assert!(empty.object_list.is_empty());
        assert_eq!(empty.num_pages, 1);
        Ok(())
    }

    #[test]
    fn post_info() -> QueryResult<()> {
        let state = test_state();
        let mut conn = state.get_connection().unwrap_or_else(|err| panic!("{err}"));
        let author = create_test_user(&mut conn, &state.config, TEST_USERNAME)?;
        let group = create_test_group(&mut conn, "test-group")?;
        let post = create_test_post(&mut conn, &author, Some(&group), "Test post about things")?;
        create_test_comment(&mut conn, &post, &author, "First")?;
        create_test_comment(&mut conn, &post, &author, "Second")?;

        let info = PostInfo::by_author(&mut conn, &state.config, TEST_USERNAME, post.id)?
            .unwrap_or_else(|| panic!("Post should exist"));
        assert_eq!(info.short_text, "Test post about");
        assert_eq!(info.author.as_str(), TEST_USERNAME);
        assert_eq!(info.group.map(|group| group.id), Some(group.id));
        assert_eq!(info.comment_count, 2);
        assert_eq!(info.image_url, None);

        assert!(PostInfo::by_author(&mut conn, &state.config, "someone_else", post.id)?.is_none());
        assert!(PostInfo::by_author(&mut conn, &state.config, TEST_USERNAME, post.id + 1)?.is_none());
        Ok(())
    }
}
