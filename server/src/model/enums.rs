use image::ImageFormat;
use strum::Display;
use thiserror::Error;

#[derive(Debug, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceType {
    Group,
    Page,
    Post,
    User,
}

#[derive(Debug, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceProperty {
    Username,
}

/// Image formats accepted for post illustrations.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MimeType {
    Bmp,
    Gif,
    Jpeg,
    Png,
    Webp,
}

impl MimeType {
    pub fn from_extension(extension: &str) -> Result<Self, ParseExtensionError> {
        match extension.to_ascii_lowercase().as_str() {
            "bmp" => Ok(Self::Bmp),
            "gif" => Ok(Self::Gif),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            _ => Err(ParseExtensionError {
                extension: String::from(extension),
            }),
        }
    }

    /// Detects the format of an image from its leading bytes.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        match image::guess_format(data).ok()? {
            ImageFormat::Bmp => Some(Self::Bmp),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::WebP => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn to_image_format(self) -> ImageFormat {
        match self {
            Self::Bmp => ImageFormat::Bmp,
            Self::Gif => ImageFormat::Gif,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Webp => ImageFormat::WebP,
        }
    }
}

#[derive(Debug, Error)]
#[error("Extension '{extension}' is not a supported image format")]
pub struct ParseExtensionError {
    extension: String,
}
