use crate::app::AppState;
use crate::auth::Client;
use crate::model::enums::ResourceType;
use crate::model::group::Group;
use crate::pagination::{Page, PageQuery};
use crate::resource::group::{self as group_resource, GroupInfo};
use crate::resource::post::{self as post_resource, PostFilter, PostInfo};
use crate::web::extract::{Path, Query};
use crate::web::{self, AppError, AppResult};
use axum::extract::{Extension, State};
use axum::response::Html;
use axum::{Router, routing};
use diesel::prelude::*;
use serde::Serialize;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups", routing::get(list))
        .route("/group/{slug}", routing::get(posts))
}

#[derive(Serialize)]
struct GroupListPage {
    groups: Vec<GroupInfo>,
}

async fn list(State(state): State<AppState>, Extension(client): Extension<Client>) -> AppResult<Html<String>> {
    let groups = GroupInfo::all(&mut *state.get_connection()?)?;
    web::render(&state, &client, "posts/group_list.html", GroupListPage { groups })
}

#[derive(Serialize)]
struct GroupPage {
    group: Group,
    page: Page<PostInfo>,
}

async fn posts(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let page = state.get_connection()?.transaction(|conn| {
        let group = group_resource::by_slug(conn, &slug)?.ok_or(AppError::NotFound(ResourceType::Group))?;
        let per_page = state.config.pagination.group;
        let filter = PostFilter::Group(group.id);
        let page = post_resource::load_page(conn, &state.config, filter, per_page, query.requested())?;
        Ok::<_, AppError>(GroupPage { group, page })
    })?;
    web::render(&state, &client, "group.html", page)
}

#[cfg(test)]
mod test {
    use crate::test::*;
    use diesel::QueryResult;

    const POST_CARD: &str = r#"<article class="post""#;

    #[tokio::test]
    async fn group_pages() -> QueryResult<()> {
        let state = test_state();
        {
            let mut conn = state.get_connection().unwrap();
            let author = create_test_user(&mut conn, &state.config, TEST_USERNAME)?;
            let cats = create_test_group(&mut conn, "cats")?;
            create_test_group(&mut conn, "dogs")?;
            for i in 0..13 {
                create_test_post(&mut conn, &author, Some(&cats), &format!("Cat post {i}"))?;
            }
            create_test_post(&mut conn, &author, None, "Ungrouped post")?;
        }
        let server = test_server(&state);

        let response = server.get("/groups/").await;
        response.assert_status_ok();
        assert!(response.text().contains("<title>Groups | Yatube</title>"));
        assert!(response.text().contains(r#"<a href="/group/cats/">Group cats</a>"#));
        assert!(response.text().contains("Posts: 13"));
        assert!(response.text().contains("Posts: 0"));

        let response = server.get("/group/cats/").await;
        response.assert_status_ok();
        assert!(response.text().contains("<title>Posts of group Group cats | Yatube</title>"));
        assert_eq!(response.text().matches(POST_CARD).count(), 12);
        assert!(!response.text().contains("Ungrouped post"));

        let response = server.get("/group/cats/").add_query_param("page", "last").await;
        assert_eq!(response.text().matches(POST_CARD).count(), 12);
        let response = server.get("/group/cats/").add_query_param("page", 5).await;
        assert_eq!(response.text().matches(POST_CARD).count(), 1);

        let response = server.get("/group/dogs/").await;
        response.assert_status_ok();
        assert!(response.text().contains("This group has no posts yet."));

        server.get("/group/birds/").await.assert_status_not_found();
        Ok(())
    }
}
