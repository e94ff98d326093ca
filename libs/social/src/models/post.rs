//! Posts and their photos

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::IdentitySummary;

/// Authored content
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Image attached to a post
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Photo {
    pub id: Uuid,
    pub post_id: Uuid,
    pub uploader_id: Uuid,
    /// Reference returned by blob storage
    pub image: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A post with everything needed to display it
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub author: IdentitySummary,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub photos: Vec<Photo>,
    pub likes_count: i64,
}

/// An uploaded file
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Browsers submit an empty part when no file was picked
    pub fn is_empty(&self) -> bool {
        self.file_name.is_empty() && self.bytes.is_empty()
    }

    /// Lower-cased extension of the uploaded file name, `bin` when unusable
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| {
                !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "bin".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> Upload {
        Upload {
            file_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![1],
        }
    }

    #[test]
    fn test_extension() {
        assert_eq!(upload("Beach.JPG").extension(), "jpg");
        assert_eq!(upload("archive.tar.gz").extension(), "gz");
        assert_eq!(upload("noext").extension(), "bin");
        assert_eq!(upload("weird.p/ng").extension(), "bin");
        assert_eq!(upload("../../x.sh;rm").extension(), "bin");
    }

    #[test]
    fn test_empty_upload() {
        let empty = Upload {
            file_name: String::new(),
            content_type: "application/octet-stream".to_string(),
            bytes: Vec::new(),
        };
        assert!(empty.is_empty());
        assert!(!upload("a.png").is_empty());
    }
}
