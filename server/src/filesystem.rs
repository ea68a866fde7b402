use crate::config::Config;
use std::ffi::OsStr;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use strum::IntoStaticStr;
use tracing::warn;
use uuid::Uuid;

/// Represents media directories.
#[derive(Clone, Copy, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Directory {
    Posts,
}

impl Directory {
    fn prefix(self) -> &'static str {
        self.into()
    }
}

/// Saves an uploaded post image under the posts directory, keeping the client's file
/// name where possible. Existing files are never overwritten. Returns the path of the
/// saved file relative to the media root.
pub fn save_post_image(config: &Config, file_name: &str, data: &[u8]) -> std::io::Result<String> {
    let directory = config.path(Directory::Posts);
    std::fs::create_dir_all(&directory)?;

    let file_name = sanitize_file_name(file_name);
    let mut candidate = file_name.clone();
    let (target, mut file) = loop {
        let target = directory.join(&candidate);
        match OpenOptions::new().write(true).create_new(true).open(&target) {
            Ok(file) => break (target, file),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => candidate = with_random_suffix(&file_name),
            Err(err) => return Err(err),
        }
    };

    if let Err(err) = file.write_all(data) {
        drop(file);
        remove_if_exists(&target)?;
        return Err(err);
    }
    if let Err(err) = set_permissions(&target) {
        warn!("Failed to set permissions for {target:?} for reason: {err}");
    }
    Ok(format!("{}/{candidate}", Directory::Posts.prefix()))
}

/// Deletes a previously saved post image, if it exists.
pub fn delete_post_image(config: &Config, relative_path: &str) -> std::io::Result<()> {
    remove_if_exists(&config.media_root.join(relative_path))
}

/// Appends a short random suffix to the stem of `file_name`.
fn with_random_suffix(file_name: &str) -> String {
    let path = Path::new(file_name);
    let stem = path.file_stem().and_then(OsStr::to_str).unwrap_or("image");
    let suffix = &Uuid::new_v4().simple().to_string()[..7];
    match path.extension().and_then(OsStr::to_str) {
        Some(extension) => format!("{stem}_{suffix}.{extension}"),
        None => format!("{stem}_{suffix}"),
    }
}

/// Strips any directory components and characters that don't belong in a file name.
fn sanitize_file_name(file_name: &str) -> String {
    let base_name = Path::new(file_name)
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or_default();
    let sanitized: String = base_name
        .chars()
        .map(|c| match c {
            c if c.is_alphanumeric() => c,
            '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    match sanitized.trim_start_matches('.') {
        "" => String::from("image"),
        name => name.to_owned(),
    }
}

/// Removes `file` if it exists.
fn remove_if_exists(file: &Path) -> std::io::Result<()> {
    if let Err(err) = std::fs::remove_file(file)
        && err.kind() != std::io::ErrorKind::NotFound
    {
        Err(err)
    } else {
        Ok(())
    }
}

#[cfg(unix)]
fn set_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_mode(0o644);
    std::fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
