//! Upload gate: classifies incoming image files before they reach storage.
//!
//! Each upload endpoint has its own multipart field name, size limit and
//! file count. The gate only says yes or no; storing the bytes is somebody
//! else's job.

use serde::Serialize;

const MB: u64 = 1024 * 1024;

/// Limits for one upload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Multipart field name the files must arrive under.
    pub field: &'static str,
    /// Maximum size of a single file, in bytes.
    pub max_file_size: u64,
    /// Maximum number of files per request.
    pub max_files: usize,
}

impl UploadLimits {
    /// Upper bound for the whole request body, with room for multipart framing.
    pub fn body_limit(&self) -> u64 {
        const MULTIPART_OVERHEAD: u64 = 64 * 1024;
        self.max_file_size * self.max_files as u64 + MULTIPART_OVERHEAD
    }
}

/// Upload endpoints and their limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadEndpoint {
    /// Profile picture, field `avatar`.
    Avatar,
    /// Food photo, field `foodImage`.
    FoodImage,
    /// Generic single image, field `image`.
    Image,
    /// Workout media gallery, field `images`.
    WorkoutMedia,
}

impl UploadEndpoint {
    pub fn limits(self) -> UploadLimits {
        match self {
            UploadEndpoint::Avatar => UploadLimits {
                field: "avatar",
                max_file_size: 3 * MB,
                max_files: 1,
            },
            UploadEndpoint::FoodImage => UploadLimits {
                field: "foodImage",
                max_file_size: 5 * MB,
                max_files: 1,
            },
            UploadEndpoint::Image => UploadLimits {
                field: "image",
                max_file_size: 5 * MB,
                max_files: 1,
            },
            UploadEndpoint::WorkoutMedia => UploadLimits {
                field: "images",
                max_file_size: 10 * MB,
                max_files: 5,
            },
        }
    }
}

/// What the gate knows about one incoming file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Multipart field name the file arrived under.
    pub field: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub size: u64,
    /// 1-based position of this file among the files of the request.
    pub ordinal: usize,
}

/// Why a file was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRejection {
    UnsupportedType,
    FileTooLarge { max_bytes: u64 },
    TooManyFiles { max_files: usize },
    UnexpectedField,
}

impl UploadRejection {
    pub fn code(&self) -> &'static str {
        match self {
            UploadRejection::UnsupportedType => "unsupported_type",
            UploadRejection::FileTooLarge { .. } => "file_too_large",
            UploadRejection::TooManyFiles { .. } => "too_many_files",
            UploadRejection::UnexpectedField => "unexpected_field",
        }
    }

    /// User-facing message.
    pub fn message(&self) -> String {
        match self {
            UploadRejection::UnsupportedType => "Only image files are allowed!".to_string(),
            UploadRejection::FileTooLarge { max_bytes } => format!(
                "File is too large. Maximum size is {}MB.",
                max_bytes / MB
            ),
            UploadRejection::TooManyFiles { max_files } => {
                format!("Too many files. Maximum is {} files.", max_files)
            }
            UploadRejection::UnexpectedField => "Unexpected field in file upload.".to_string(),
        }
    }
}

/// The checks that only need the part headers: field name, then MIME type.
///
/// Run this as soon as a part arrives, before any of its bytes are read.
pub fn screen(field: &str, content_type: &str, limits: &UploadLimits) -> Result<(), UploadRejection> {
    if field != limits.field {
        return Err(UploadRejection::UnexpectedField);
    }
    if !content_type.starts_with("image/") {
        return Err(UploadRejection::UnsupportedType);
    }
    Ok(())
}

/// Decide whether a single file may pass.
///
/// A file sent under the wrong field is rejected first; after that the
/// checks run in order: MIME type, size, count.
pub fn accept(file: &FileDescriptor, limits: &UploadLimits) -> Result<(), UploadRejection> {
    screen(&file.field, &file.content_type, limits)?;
    if file.size > limits.max_file_size {
        return Err(UploadRejection::FileTooLarge {
            max_bytes: limits.max_file_size,
        });
    }
    if file.ordinal > limits.max_files {
        return Err(UploadRejection::TooManyFiles {
            max_files: limits.max_files,
        });
    }
    Ok(())
}
