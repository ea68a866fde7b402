use crate::app::AppState;
use crate::auth::Client;
use crate::cache::CacheKey;
use crate::filesystem;
use crate::form::{CommentForm, FormErrors, ImageChange, PostForm, ValidPost};
use crate::model::enums::ResourceType;
use crate::model::group::Group;
use crate::model::post::{NewPost, Post, PostChanges};
use crate::pagination::{Page, PageQuery};
use crate::resource::comment::CommentInfo;
use crate::resource::group as group_resource;
use crate::resource::post::{self as post_resource, PostFilter, PostInfo};
use crate::resource::user::{self as user_resource, ProfileInfo};
use crate::schema::{post, user};
use crate::time::DateTime;
use crate::web::extract::{FormOrMultipart, LoggedIn, Path, Query};
use crate::web::{self, AppError, AppResult, upload};
use axum::extract::{Extension, FromRequest, OriginalUri, Request, State};
use axum::response::{Html, IntoResponse, Response};
use axum::{Router, routing};
use diesel::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", routing::get(index))
        .route("/new", routing::get(new_post_form).post(create_post))
        .route("/{username}/{post_id}", routing::get(view))
        .route("/{username}/{post_id}/edit", routing::get(edit_post_form).post(edit_post))
}

#[derive(Serialize)]
struct ListingPage {
    page: Page<PostInfo>,
}

/// The index page. Rendered pages are cached per client for a short while.
async fn index(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let key = CacheKey::new(uri.to_string(), client.id);
    let cached_page = state.page_cache().get(&key);
    if let Some(html) = cached_page {
        return Ok(Html(html));
    }

    let page = {
        let mut conn = state.get_connection()?;
        let per_page = state.config.pagination.index;
        post_resource::load_page(&mut conn, &state.config, PostFilter::All, per_page, query.requested())?
    };
    let html = web::render(&state, &client, "index.html", ListingPage { page })?;
    state.page_cache().insert(key, html.0.clone());
    Ok(html)
}

#[derive(Serialize)]
struct PostFormPage<'a> {
    form: &'a PostForm,
    errors: &'a FormErrors,
    groups: &'a [Group],
    is_edit: bool,
    post: Option<&'a PostInfo>,
}

async fn new_post_form(State(state): State<AppState>, user: LoggedIn) -> AppResult<Html<String>> {
    let groups = {
        let mut conn = state.get_connection()?;
        group_resource::all_groups(&mut conn)?
    };
    let page = PostFormPage {
        form: &PostForm::default(),
        errors: &FormErrors::default(),
        groups: &groups,
        is_edit: false,
        post: None,
    };
    web::render(&state, &user.client(), "posts/new.html", page)
}

async fn create_post(
    State(state): State<AppState>,
    user: LoggedIn,
    body: FormOrMultipart<PostForm>,
) -> AppResult<Response> {
    let mut form = upload::read_post_form(body).await?;
    let mut conn = state.get_connection()?;
    let groups = group_resource::all_groups(&mut conn)?;
    let valid_post = match form.validate(&groups) {
        Ok(valid_post) => valid_post,
        Err(errors) => {
            drop(conn);
            let page = PostFormPage {
                form: &form,
                errors: &errors,
                groups: &groups,
                is_edit: false,
                post: None,
            };
            return web::render(&state, &user.client(), "posts/new.html", page).map(IntoResponse::into_response);
        }
    };

    let ValidPost { text, group_id, image } = valid_post;
    let image = match image {
        ImageChange::Replace(upload) => Some(filesystem::save_post_image(&state.config, &upload.file_name, &upload.data)?),
        ImageChange::Keep | ImageChange::Clear => None,
    };
    let new_post = NewPost {
        text: &text,
        creation_time: DateTime::now(),
        user_id: user.id,
        group_id,
        image: image.as_deref(),
    };
    let result = new_post.insert_into(post::table).returning(Post::as_returning()).get_result(&mut conn);
    let post = match result {
        Ok(post) => post,
        Err(err) => {
            if let Some(image) = &image {
                remove_image(&state, image);
            }
            return Err(err.into());
        }
    };

    state.page_cache().clear();
    info!("{} published post {} '{}'", user.name, post.id, post.short_text());
    Ok(web::redirect("/"))
}

#[derive(Serialize)]
struct PostViewPage {
    post: PostInfo,
    author: ProfileInfo,
    comments: Vec<CommentInfo>,
    form: CommentForm,
}

async fn view(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Path((username, post_id)): Path<(String, i64)>,
) -> AppResult<Html<String>> {
    let page = state.get_connection()?.transaction(|conn| {
        let post = PostInfo::by_author(conn, &state.config, &username, post_id)?
            .ok_or(AppError::NotFound(ResourceType::Post))?;
        let author = user_resource::by_name(conn, &username)?.ok_or(AppError::NotFound(ResourceType::User))?;
        Ok::<_, AppError>(PostViewPage {
            author: ProfileInfo::new(conn, author)?,
            comments: CommentInfo::all_for_post(conn, post.id)?,
            post,
            form: CommentForm::default(),
        })
    })?;
    web::render(&state, &client, "posts/post.html", page)
}

/// Finds the post `post_id`, provided it was written by `username`.
pub fn find_post(conn: &mut SqliteConnection, username: &str, post_id: i64) -> AppResult<Post> {
    post::table
        .inner_join(user::table)
        .select(Post::as_select())
        .filter(post::id.eq(post_id))
        .filter(user::name.eq(username))
        .first(conn)
        .optional()?
        .ok_or(AppError::NotFound(ResourceType::Post))
}

async fn edit_post_form(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Path((username, post_id)): Path<(String, i64)>,
) -> AppResult<Response> {
    let mut conn = state.get_connection()?;
    let post = find_post(&mut conn, &username, post_id)?;
    if client.id != Some(post.user_id) {
        return Ok(web::redirect(&web::post_path(&username, post_id)));
    }

    let groups = group_resource::all_groups(&mut conn)?;
    let info = PostInfo::by_author(&mut conn, &state.config, &username, post_id)?;
    drop(conn);

    let page = PostFormPage {
        form: &PostForm::from_post(&post),
        errors: &FormErrors::default(),
        groups: &groups,
        is_edit: true,
        post: info.as_ref(),
    };
    web::render(&state, &client, "posts/new.html", page).map(IntoResponse::into_response)
}

/// Only the author may edit a post. Everyone else is sent back to the post's page
/// before the body is read.
async fn edit_post(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Path((username, post_id)): Path<(String, i64)>,
    request: Request,
) -> AppResult<Response> {
    let post_path = web::post_path(&username, post_id);
    let post = {
        let mut conn = state.get_connection()?;
        find_post(&mut conn, &username, post_id)?
    };
    if client.id != Some(post.user_id) {
        return Ok(web::redirect(&post_path));
    }

    let body = FormOrMultipart::<PostForm>::from_request(request, &state).await?;
    let mut form = upload::read_post_form(body).await?;
    let mut conn = state.get_connection()?;
    let groups = group_resource::all_groups(&mut conn)?;
    let valid_post = match form.validate(&groups) {
        Ok(valid_post) => valid_post,
        Err(errors) => {
            let info = PostInfo::by_author(&mut conn, &state.config, &username, post_id)?;
            drop(conn);
            let page = PostFormPage {
                form: &form,
                errors: &errors,
                groups: &groups,
                is_edit: true,
                post: info.as_ref(),
            };
            return web::render(&state, &client, "posts/new.html", page).map(IntoResponse::into_response);
        }
    };

    let ValidPost { text, group_id, image } = valid_post;
    let new_image = match image {
        ImageChange::Keep => post.image.clone(),
        ImageChange::Clear => None,
        ImageChange::Replace(upload) => Some(filesystem::save_post_image(&state.config, &upload.file_name, &upload.data)?),
    };
    let changes = PostChanges {
        text: &text,
        group_id,
        image: new_image.as_deref(),
    };
    diesel::update(post::table.find(post.id)).set(changes).execute(&mut conn)?;
    drop(conn);

    if let Some(old_image) = post.image.as_deref()
        && new_image.as_deref() != Some(old_image)
    {
        remove_image(&state, old_image);
    }
    state.page_cache().clear();
    info!("{} edited post {}", username, post.id);
    Ok(web::redirect(&post_path))
}

/// Deletes a post image, logging any failure.
fn remove_image(state: &AppState, relative_path: &str) {
    if let Err(err) = filesystem::delete_post_image(&state.config, relative_path) {
        warn!("Could not delete image {relative_path}. Details:\n{err}");
    }
}

#[cfg(test)]
mod test {
    use crate::model::post::Post;
    use crate::schema::{comment, group, post, user};
    use crate::test::*;
    use axum::http::StatusCode;
    use axum::http::header::{COOKIE, LOCATION};
    use axum_test::multipart::{MultipartForm, Part};
    use diesel::dsl::count_star;
    use diesel::prelude::*;

    const POST_CARD: &str = r#"<article class="post""#;

    #[tokio::test]
    async fn index_pages() -> QueryResult<()> {
        let state = test_state();
        let (author, cookie) = create_logged_in_user(&state, TEST_USERNAME);
        {
            let mut conn = state.get_connection().unwrap();
            for i in 0..13 {
                create_test_post(&mut conn, &author, None, &format!("Post number {i}"))?;
            }
        }
        let server = test_server(&state);

        let response = server.get("/").await;
        response.assert_status_ok();
        assert!(response.text().contains("<title>Latest updates | Yatube</title>"));
        assert_eq!(response.text().matches(POST_CARD).count(), 10);
        assert!(response.text().contains("Post number 12"));

        let response = server.get("/").add_query_param("page", 2).await;
        assert_eq!(response.text().matches(POST_CARD).count(), 3);
        assert!(response.text().contains("Post number 0"));

        // Logged in clients see the same cards along with links to their own profile
        let response = server.get("/").add_header(COOKIE, cookie).await;
        response.assert_status_ok();
        assert_eq!(response.text().matches(POST_CARD).count(), 10);
        assert!(response.text().contains(&format!(r#"<a href="/{TEST_USERNAME}/">{TEST_USERNAME}</a>"#)));
        Ok(())
    }

    #[tokio::test]
    async fn index_cache() -> QueryResult<()> {
        let state = test_state();
        let (author, cookie) = create_logged_in_user(&state, TEST_USERNAME);
        let server = test_server(&state);

        assert!(!server.get("/").await.text().contains("Cached text"));
        {
            let mut conn = state.get_connection().unwrap();
            create_test_post(&mut conn, &author, None, "Cached text")?;
        }
        assert!(!server.get("/").await.text().contains("Cached text"));
        state.page_cache().clear();
        assert!(server.get("/").await.text().contains("Cached text"));

        // Publishing through the site invalidates cached pages
        let response = server
            .post("/new/")
            .add_header(COOKIE, cookie.clone())
            .form(&[("text", "Fresh text"), ("group", "")])
            .await;
        response.assert_status(StatusCode::FOUND);
        assert!(server.get("/").await.text().contains("Fresh text"));

        // So does editing
        let post_id: i64 = {
            let mut conn = state.get_connection().unwrap();
            post::table.select(post::id).filter(post::text.eq("Fresh text")).first(&mut conn)?
        };
        let response = server
            .post(&format!("/{TEST_USERNAME}/{post_id}/edit/"))
            .add_header(COOKIE, cookie)
            .form(&[("text", "Edited text"), ("group", "")])
            .await;
        response.assert_status(StatusCode::FOUND);
        let index = server.get("/").await.text();
        assert!(index.contains("Edited text"));
        assert!(!index.contains("Fresh text"));
        Ok(())
    }

    #[tokio::test]
    async fn new_post() -> QueryResult<()> {
        let state = test_state();
        let (_, cookie) = create_logged_in_user(&state, TEST_USERNAME);
        let group = {
            let mut conn = state.get_connection().unwrap();
            create_test_group(&mut conn, "cats")?
        };
        let server = test_server(&state);

        let response = server.get("/new/").await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header(LOCATION), "/auth/login/?next=/new/");

        let response = server.get("/new/").add_header(COOKIE, cookie.clone()).await;
        response.assert_status_ok();
        assert!(response.text().contains("<title>New post | Yatube</title>"));
        assert!(response.text().contains("Group cats"));

        let response = server
            .post("/new/")
            .add_header(COOKIE, cookie.clone())
            .form(&[("text", "   "), ("group", "")])
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("This field is required."));

        let group_id = group.id.to_string();
        let response = server
            .post("/new/")
            .add_header(COOKIE, cookie)
            .form(&[("text", "Post in a group"), ("group", group_id.as_str())])
            .await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header(LOCATION), "/");

        let mut conn = state.get_connection().unwrap();
        let posts: Vec<Post> = post::table.select(Post::as_select()).load(&mut conn)?;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].text, "Post in a group");
        assert_eq!(posts[0].group_id, Some(group.id));
        Ok(())
    }

    #[tokio::test]
    async fn post_images() -> QueryResult<()> {
        let state = test_state();
        let (_, cookie) = create_logged_in_user(&state, TEST_USERNAME);
        {
            let mut conn = state.get_connection().unwrap();
            create_test_group(&mut conn, "cats")?;
        }
        let server = test_server(&state);

        let form = MultipartForm::new()
            .add_text("text", "Not really an image")
            .add_part("image", Part::bytes(b"plain text".as_slice()).file_name("fake.gif").mime_type("image/gif"));
        let response = server.post("/new/").add_header(COOKIE, cookie.clone()).multipart(form).await;
        response.assert_status_ok();
        assert!(response.text().contains("Upload a valid image."));

        let group_id = {
            let mut conn = state.get_connection().unwrap();
            group::table.select(group::id).first::<i64>(&mut conn)?
        };
        let form = MultipartForm::new()
            .add_text("text", "Post with an image")
            .add_text("group", group_id.to_string())
            .add_part("image", Part::bytes(SMALL_GIF).file_name("small.gif").mime_type("image/gif"));
        let response = server.post("/new/").add_header(COOKIE, cookie.clone()).multipart(form).await;
        response.assert_status(StatusCode::FOUND);

        let post = {
            let mut conn = state.get_connection().unwrap();
            post::table.select(Post::as_select()).first(&mut conn)?
        };
        assert_eq!(post.image.as_deref(), Some("posts/small.gif"));

        let image_url = "/media/posts/small.gif";
        let pages = [
            String::from("/"),
            format!("/{TEST_USERNAME}/"),
            String::from("/group/cats/"),
            format!("/{TEST_USERNAME}/{}/", post.id),
        ];
        for page in pages {
            let response = server.get(&page).await;
            response.assert_status_ok();
            assert!(response.text().contains(image_url), "{page} has no image");
        }
        let response = server.get(image_url).await;
        response.assert_status_ok();
        assert_eq!(response.as_bytes().as_ref(), SMALL_GIF);

        let response = server
            .post(&format!("/{TEST_USERNAME}/{}/edit/", post.id))
            .add_header(COOKIE, cookie)
            .form(&[("text", "Post without an image"), ("group", ""), ("image-clear", "on")])
            .await;
        response.assert_status(StatusCode::FOUND);
        let image: Option<String> = {
            let mut conn = state.get_connection().unwrap();
            post::table.find(post.id).select(post::image).first(&mut conn)?
        };
        assert_eq!(image, None);
        assert!(!state.config.media_root.join("posts/small.gif").exists());
        server.get(image_url).await.assert_status_not_found();
        Ok(())
    }

    #[tokio::test]
    async fn post_page() -> QueryResult<()> {
        let state = test_state();
        let post = {
            let mut conn = state.get_connection().unwrap();
            let author = create_test_user(&mut conn, &state.config, TEST_USERNAME)?;
            create_test_user(&mut conn, &state.config, "other_user")?;
            let post = create_test_post(&mut conn, &author, None, "A fairly long post text")?;
            create_test_comment(&mut conn, &post, &author, "First comment")?;
            post
        };
        let server = test_server(&state);

        let response = server.get(&format!("/{TEST_USERNAME}/{}/", post.id)).await;
        response.assert_status_ok();
        assert!(response.text().contains("<title>Post A fairly long p | Yatube</title>"));
        assert!(response.text().contains("A fairly long post text"));
        assert!(response.text().contains("First comment"));

        server.get(&format!("/other_user/{}/", post.id)).await.assert_status_not_found();
        server.get(&format!("/{TEST_USERNAME}/{}/", post.id + 1)).await.assert_status_not_found();
        server.get(&format!("/{TEST_USERNAME}/not-a-number/")).await.assert_status_not_found();
        Ok(())
    }

    #[tokio::test]
    async fn edit_permissions() -> QueryResult<()> {
        let state = test_state();
        let (author, author_cookie) = create_logged_in_user(&state, TEST_USERNAME);
        let (_, other_cookie) = create_logged_in_user(&state, "other_user");
        let post = {
            let mut conn = state.get_connection().unwrap();
            create_test_post(&mut conn, &author, None, "Original text")?
        };
        let server = test_server(&state);
        let post_path = format!("/{TEST_USERNAME}/{}/", post.id);
        let edit_path = format!("/{TEST_USERNAME}/{}/edit/", post.id);

        let response = server.get(&edit_path).await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header(LOCATION), post_path.as_str());

        let response = server.get(&edit_path).add_header(COOKIE, other_cookie.clone()).await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header(LOCATION), post_path.as_str());

        let response = server
            .post(&edit_path)
            .add_header(COOKIE, other_cookie)
            .form(&[("text", "Hijacked text")])
            .await;
        response.assert_status(StatusCode::FOUND);
        assert!(server.get(&post_path).await.text().contains("Original text"));

        // Requests without a form body are turned away before the body is read
        let response = server.post(&edit_path).await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header(LOCATION), post_path.as_str());
        server
            .post(&format!("/{TEST_USERNAME}/{}/edit/", post.id + 1))
            .add_header(COOKIE, author_cookie.clone())
            .await
            .assert_status_not_found();

        let response = server.get(&edit_path).add_header(COOKIE, author_cookie.clone()).await;
        response.assert_status_ok();
        assert!(response.text().contains("<title>Edit post | Yatube</title>"));
        assert!(response.text().contains("Original text"));

        let response = server
            .post(&edit_path)
            .add_header(COOKIE, author_cookie.clone())
            .form(&[("text", "Edited text")])
            .await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header(LOCATION), post_path.as_str());
        assert!(server.get(&post_path).await.text().contains("Edited text"));

        let other_edit_path = format!("/other_user/{}/edit/", post.id);
        server
            .get(&other_edit_path)
            .add_header(COOKIE, author_cookie)
            .await
            .assert_status_not_found();
        Ok(())
    }

    #[test]
    fn deletion_cascades() -> QueryResult<()> {
        let state = test_state();
        let mut conn = state.get_connection().unwrap();
        let author = create_test_user(&mut conn, &state.config, TEST_USERNAME)?;
        let group = create_test_group(&mut conn, "cats")?;
        let post = create_test_post(&mut conn, &author, Some(&group), "Grouped post")?;
        create_test_comment(&mut conn, &post, &author, "Comment")?;

        diesel::delete(group::table.find(group.id)).execute(&mut conn)?;
        let group_id: Option<i64> = post::table.find(post.id).select(post::group_id).first(&mut conn)?;
        assert_eq!(group_id, None);

        diesel::delete(user::table.find(author.id)).execute(&mut conn)?;
        let post_count: i64 = post::table.select(count_star()).first(&mut conn)?;
        let comment_count: i64 = comment::table.select(count_star()).first(&mut conn)?;
        assert_eq!(post_count, 0);
        assert_eq!(comment_count, 0);
        Ok(())
    }
}
