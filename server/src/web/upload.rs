use crate::form::{ImageUpload, PostForm};
use crate::web::AppResult;
use crate::web::extract::FormOrMultipart;
use tracing::debug;

/// Reads a post form from either an urlencoded or a multipart body.
/// Only multipart bodies can carry an image.
pub async fn read_post_form(body: FormOrMultipart<PostForm>) -> AppResult<PostForm> {
    let mut multipart = match body {
        FormOrMultipart::Form(form) => return Ok(form),
        FormOrMultipart::Multipart(multipart) => multipart,
    };

    let mut form = PostForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "text" => form.text = field.text().await?,
            "group" => form.group = field.text().await?,
            "image-clear" => form.image_clear = Some(field.text().await?),
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let data = field.bytes().await?;
                form.image = Some(ImageUpload {
                    file_name,
                    data: data.to_vec(),
                });
            }
            _ => debug!("Ignoring unknown post form field '{name}'"),
        }
    }
    Ok(form)
}
