use crate::config::{Config, RegexType};
use crate::model::enums::MimeType;
use crate::model::group::Group;
use crate::model::post::Post;
use crate::schema::user;
use diesel::dsl::exists;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;

/// Usernames that would shadow top-level routes.
pub const RESERVED_USERNAMES: [&str; 7] = ["new", "group", "groups", "follow", "about", "auth", "media"];

const REQUIRED: &str = "This field is required.";
const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Validation errors keyed by form field. Errors that don't belong to a single field are stored under `form`.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        match self.is_empty() {
            true => Ok(value),
            false => Err(self),
        }
    }
}

impl Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut separator = "";
        for (field, messages) in &self.0 {
            for message in messages {
                write!(f, "{separator}{field}: {message}")?;
                separator = "\n";
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// What should happen to the image of a post when a post form is saved.
#[derive(Debug)]
pub enum ImageChange {
    Keep,
    Clear,
    Replace(ImageUpload),
}

#[derive(Debug)]
pub struct ValidPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: ImageChange,
}

/// Form for creating and editing posts. The image is read separately from multipart bodies.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: String,
    #[serde(default, rename = "image-clear", skip_serializing)]
    pub image_clear: Option<String>,
    #[serde(skip)]
    pub image: Option<ImageUpload>,
}

impl PostForm {
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
            image_clear: None,
            image: None,
        }
    }

    /// Validates the form against the `groups` that currently exist.
    /// The uploaded image is moved out of the form on success.
    pub fn validate(&mut self, groups: &[Group]) -> Result<ValidPost, FormErrors> {
        let mut errors = FormErrors::default();

        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }

        let group = self.group.trim();
        let group_id = match group {
            "" => None,
            _ => {
                let id = group.parse::<i64>().ok().filter(|id| groups.iter().any(|group| group.id == *id));
                if id.is_none() {
                    errors.add("group", "Select a valid choice. That choice is not one of the available choices.");
                }
                id
            }
        };

        let clear_image = self.image_clear.as_deref().is_some_and(is_checked);
        let upload = self.image.take().filter(|upload| !(upload.file_name.is_empty() && upload.data.is_empty()));
        if let Some(upload) = &upload {
            validate_image(upload, &mut errors);
            if clear_image {
                errors.add("image", "Please either submit a file or check the clear checkbox, not both.");
            }
        }
        let image = match (upload, clear_image) {
            (Some(upload), _) => ImageChange::Replace(upload),
            (None, true) => ImageChange::Clear,
            (None, false) => ImageChange::Keep,
        };

        let valid_post = ValidPost {
            text: text.to_owned(),
            group_id,
            image,
        };
        errors.into_result(valid_post)
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<&str, FormErrors> {
        let text = self.text.trim();
        let mut errors = FormErrors::default();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }
        errors.into_result(text)
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password1: String,
    #[serde(default, skip_serializing)]
    pub password2: String,
}

impl SignupForm {
    pub fn validate(&self, conn: &mut SqliteConnection, config: &Config) -> QueryResult<FormErrors> {
        let mut errors = FormErrors::default();

        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if !config.regex(RegexType::Username).is_match(username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        } else if username.chars().all(|c| c == '.') {
            // Profiles at `/./` and `/../` are unreachable
            errors.add("username", "A username can't consist of dots only.");
        } else if RESERVED_USERNAMES.iter().any(|name| name.eq_ignore_ascii_case(username)) {
            errors.add("username", "This username is reserved.");
        } else {
            let taken: bool = diesel::select(exists(user::table.filter(user::name.eq(username)))).get_result(conn)?;
            if taken {
                errors.add("username", "A user with that username already exists.");
            }
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else if !config.regex(RegexType::Password).is_match(&self.password1) {
            errors.add("password1", "This password is too short. It must contain at least 8 characters.");
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }
        Ok(errors)
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub next: String,
}

impl LoginForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        if self.username.trim().is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors
    }

    /// Where to send the client after logging in. Only paths on this site are allowed.
    pub fn redirect_target(&self) -> &str {
        let next = self.next.trim();
        let is_local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
        if is_local { next } else { "/" }
    }
}

/// Checkbox values as browsers send them.
fn is_checked(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "" | "0" | "false" | "off")
}

fn validate_image(upload: &ImageUpload, errors: &mut FormErrors) {
    if upload.data.is_empty() {
        errors.add("image", "The submitted file is empty.");
        return;
    }

    let extension = Path::new(&upload.file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or_default();
    if MimeType::from_extension(extension).is_err() {
        errors.add(
            "image",
            format!("File extension \u{201c}{extension}\u{201d} is not allowed. Allowed extensions are: bmp, gif, jpeg, jpg, png, webp."),
        );
        return;
    }

    let decodes = MimeType::sniff(&upload.data)
        .is_some_and(|mime_type| image::load_from_memory_with_format(&upload.data, mime_type.to_image_format()).is_ok());
    if !decodes {
        errors.add("image", INVALID_IMAGE);
    }
}
