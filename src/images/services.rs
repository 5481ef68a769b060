use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use axum::extract::Multipart;
use bytes::Bytes;
use tracing::warn;
use uuid::Uuid;

use crate::{error::ApiError, storage::StorageClient};

pub const ONLY_IMAGES_MSG: &str = "Only image files are allowed!";

/// Folder an upload belongs to; doubles as its public URL prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFolder {
    Property,
    Profile,
}

impl ImageFolder {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFolder::Property => "Property",
            ImageFolder::Profile => "Profile",
        }
    }
}

/// An image that passed the type checks and still lives in memory.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
    pub ext: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
}

/// Text fields plus at most one image from a multipart body.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub image: Option<UploadItem>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// `None` when the field is absent or blank.
    pub fn non_blank(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Both the file extension and the declared MIME type must name an allowed image type.
pub fn check_image(file_name: &str, content_type: &str) -> Option<&'static str> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())?;
    let ext = match ext.as_str() {
        "jpeg" => "jpeg",
        "jpg" => "jpg",
        "png" => "png",
        "gif" => "gif",
        _ => return None,
    };
    let mime: mime::Mime = content_type.parse().ok()?;
    if mime.type_() != mime::IMAGE {
        return None;
    }
    match mime.subtype().as_str() {
        "jpeg" | "jpg" | "png" | "gif" => Some(ext),
        _ => None,
    }
}

/// Drains the multipart body. The file under `file_field` is type-checked here, before
/// anything is written anywhere.
pub async fn read_form(mut mp: Multipart, file_field: &str) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    while let Some(field) = mp.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == file_field {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let body = field.bytes().await?;
            if file_name.is_empty() && body.is_empty() {
                continue;
            }
            let Some(ext) = check_image(&file_name, &content_type) else {
                warn!(%file_name, %content_type, "rejected upload");
                return Err(ApiError::BadRequest(ONLY_IMAGES_MSG.into()));
            };
            form.image = Some(UploadItem {
                body,
                content_type,
                ext,
            });
        } else {
            let value = field.text().await?;
            form.fields.insert(name, value);
        }
    }
    Ok(form)
}

pub async fn store_image(
    storage: &dyn StorageClient,
    folder: ImageFolder,
    item: UploadItem,
) -> anyhow::Result<StoredImage> {
    let key = format!("{}/{}.{}", folder.as_str(), Uuid::new_v4(), item.ext);
    storage
        .put_object(&key, item.body, &item.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    Ok(StoredImage {
        url: storage.public_url(&key),
        key,
    })
}

/// Cleanup path; a leftover file is logged, not fatal.
pub async fn discard_image(storage: &dyn StorageClient, key: &str) {
    if let Err(e) = storage.delete_object(key).await {
        warn!(error = ?e, key, "failed to remove stored image");
    }
}

#[cfg(test)]
mod image_tests {
    use super::*;
    use crate::testing::FakeStorage;

    #[test]
    fn accepts_matching_image_types() {
        assert_eq!(check_image("house.JPG", "image/jpeg"), Some("jpg"));
        assert_eq!(check_image("house.jpeg", "image/jpeg"), Some("jpeg"));
        assert_eq!(check_image("plan.png", "image/png"), Some("png"));
        assert_eq!(check_image("anim.gif", "image/gif"), Some("gif"));
    }

    #[test]
    fn rejects_other_types() {
        assert_eq!(check_image("doc.pdf", "application/pdf"), None);
        assert_eq!(check_image("photo.webp", "image/webp"), None);
        assert_eq!(check_image("evil.png", "text/html"), None);
        assert_eq!(check_image("noext", "image/png"), None);
        assert_eq!(check_image("x.png", "not a mime"), None);
    }

    #[tokio::test]
    async fn store_image_uses_folder_prefix() {
        let storage = FakeStorage::default();
        let stored = store_image(
            &storage,
            ImageFolder::Property,
            UploadItem {
                body: Bytes::from_static(b"gif"),
                content_type: "image/gif".into(),
                ext: "gif",
            },
        )
        .await
        .unwrap();
        assert!(stored.key.starts_with("Property/"));
        assert!(stored.key.ends_with(".gif"));
        assert_eq!(stored.url, format!("/{}", stored.key));
        assert!(storage.contains(&stored.key));

        discard_image(&storage, &stored.key).await;
        assert!(!storage.contains(&stored.key));
    }
}
