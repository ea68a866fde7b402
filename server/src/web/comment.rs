use crate::app::AppState;
use crate::form::CommentForm;
use crate::model::comment::NewComment;
use crate::schema::comment;
use crate::time::DateTime;
use crate::web::extract::{LoggedIn, Path};
use crate::web::{self, AppResult, post};
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::response::Response;
use axum::{Router, routing};
use diesel::prelude::*;
use tracing::debug;

pub fn routes() -> Router<AppState> {
    Router::new().route("/{username}/{post_id}/comment", routing::get(add).post(add))
}

/// Adds a comment to a post. Missing or invalid forms just lead back to the post.
async fn add(
    State(state): State<AppState>,
    user: LoggedIn,
    Path((username, post_id)): Path<(String, i64)>,
    form: Result<Form<CommentForm>, FormRejection>,
) -> AppResult<Response> {
    let post_path = web::post_path(&username, post_id);
    let mut conn = state.get_connection()?;
    let post = post::find_post(&mut conn, &username, post_id)?;

    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            debug!("Rejected comment form. Details:\n{rejection}");
            return Ok(web::redirect(&post_path));
        }
    };
    let Ok(text) = form.validate() else {
        return Ok(web::redirect(&post_path));
    };

    NewComment {
        post_id: post.id,
        user_id: user.id,
        text,
        creation_time: DateTime::now(),
    }
    .insert_into(comment::table)
    .execute(&mut conn)?;
    Ok(web::redirect(&post_path))
}

#[cfg(test)]
mod test {
    use crate::schema::comment;
    use crate::test::*;
    use axum::http::StatusCode;
    use axum::http::header::{COOKIE, LOCATION};
    use diesel::dsl::count_star;
    use diesel::prelude::*;

    fn comment_count(state: &crate::app::AppState) -> QueryResult<i64> {
        let mut conn = state.get_connection().unwrap();
        comment::table.select(count_star()).first(&mut conn)
    }

    #[tokio::test]
    async fn commenting() -> QueryResult<()> {
        let state = test_state();
        let (author, cookie) = create_logged_in_user(&state, TEST_USERNAME);
        let post = {
            let mut conn = state.get_connection().unwrap();
            create_test_post(&mut conn, &author, None, "Post to comment on")?
        };
        let server = test_server(&state);
        let post_path = format!("/{TEST_USERNAME}/{}/", post.id);
        let comment_path = format!("/{TEST_USERNAME}/{}/comment", post.id);

        let response = server.post(&comment_path).form(&[("text", "Anonymous comment")]).await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header(LOCATION), format!("/auth/login/?next={comment_path}").as_str());
        assert_eq!(comment_count(&state)?, 0);

        for body in [[("text", "")], [("text", "   ")]] {
            let response = server.post(&comment_path).add_header(COOKIE, cookie.clone()).form(&body).await;
            response.assert_status(StatusCode::FOUND);
            assert_eq!(response.header(LOCATION), post_path.as_str());
        }
        let response = server.get(&comment_path).add_header(COOKIE, cookie.clone()).await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header(LOCATION), post_path.as_str());
        assert_eq!(comment_count(&state)?, 0);

        let response = server
            .post(&comment_path)
            .add_header(COOKIE, cookie.clone())
            .form(&[("text", "Thoughtful comment")])
            .await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header(LOCATION), post_path.as_str());
        assert_eq!(comment_count(&state)?, 1);
        assert!(server.get(&post_path).await.text().contains("Thoughtful comment"));

        server
            .post(&format!("/other_user/{}/comment", post.id))
            .add_header(COOKIE, cookie)
            .form(&[("text", "Lost comment")])
            .await
            .assert_status_not_found();
        Ok(())
    }
}
