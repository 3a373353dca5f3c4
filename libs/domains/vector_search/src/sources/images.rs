use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use core_config::{ConfigError, FromEnv, env_list, env_or_default, env_required};
use futures::TryStreamExt;
use object_store::ObjectStore;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as StorePath;
use serde_json::json;

use super::{ItemSource, SourceContent, SourceItem};
use crate::error::{VectorSearchError, VectorSearchResult};
use crate::models::Payload;

/// Backing storage for image files
#[derive(Debug, Clone, PartialEq)]
pub enum ImageStorage {
    Directory(PathBuf),
    AzureBlob {
        account: String,
        access_key: String,
        container: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageSourceConfig {
    pub storage: ImageStorage,
    /// Fixed list of object names; empty means list the store
    pub names: Vec<String>,
}

impl FromEnv for ImageSourceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let kind = env_or_default("IMAGES_SOURCE", "directory");
        let storage = match kind.trim().to_ascii_lowercase().as_str() {
            "directory" => ImageStorage::Directory(PathBuf::from(env_required(
                "IMAGES_DIRECTORY_PATH",
            )?)),
            "azure_blob" => ImageStorage::AzureBlob {
                account: env_required("AZURE_STORAGE_ACCOUNT")?,
                access_key: env_required("AZURE_STORAGE_ACCESS_KEY")?,
                container: env_required("AZURE_STORAGE_CONTAINER")?,
            },
            other => {
                return Err(ConfigError::ParseError {
                    key: "IMAGES_SOURCE".to_string(),
                    details: format!("expected 'directory' or 'azure_blob', got '{}'", other),
                });
            }
        };

        Ok(Self {
            storage,
            names: env_list("IMAGES_NAMES"),
        })
    }
}

/// MIME type for a file name, by extension
pub fn image_format(name: &str) -> Option<&'static str> {
    let (_, extension) = name.rsplit_once('.')?;
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Images read from a local directory or an Azure Blob container
pub struct ObjectStoreImageSource {
    store: Arc<dyn ObjectStore>,
    names: Vec<String>,
}

impl ObjectStoreImageSource {
    pub fn new(store: Arc<dyn ObjectStore>, names: Vec<String>) -> Self {
        Self { store, names }
    }

    pub fn from_config(config: ImageSourceConfig) -> VectorSearchResult<Self> {
        let store: Arc<dyn ObjectStore> = match config.storage {
            ImageStorage::Directory(path) => {
                let fs = LocalFileSystem::new_with_prefix(&path).map_err(|e| {
                    VectorSearchError::Configuration(format!(
                        "Image directory '{}' is not usable: {}",
                        path.display(),
                        e
                    ))
                })?;
                Arc::new(fs)
            }
            ImageStorage::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let azure = MicrosoftAzureBuilder::new()
                    .with_account(account)
                    .with_access_key(access_key)
                    .with_container_name(container)
                    .build()
                    .map_err(|e| {
                        VectorSearchError::Configuration(format!(
                            "Azure Blob storage is not usable: {}",
                            e
                        ))
                    })?;
                Arc::new(azure)
            }
        };

        Ok(Self::new(store, config.names))
    }
}

#[async_trait]
impl ItemSource for ObjectStoreImageSource {
    async fn list(&self) -> VectorSearchResult<Vec<SourceItem>> {
        if !self.names.is_empty() {
            return Ok(self.names.iter().map(SourceItem::new).collect());
        }

        let objects: Vec<_> = self.store.list(None).try_collect().await?;
        let mut names: Vec<String> = objects
            .into_iter()
            .map(|meta| meta.location.to_string())
            .filter(|name| image_format(name).is_some())
            .collect();
        names.sort();

        Ok(names.into_iter().map(SourceItem::new).collect())
    }

    async fn resolve(&self, item: &SourceItem) -> VectorSearchResult<SourceContent> {
        let format = image_format(&item.name).ok_or_else(|| {
            VectorSearchError::Source(format!("'{}' is not a supported image type", item.name))
        })?;

        let bytes = self
            .store
            .get(&StorePath::from(item.name.as_str()))
            .await?
            .bytes()
            .await?;

        Ok(SourceContent::Image {
            bytes: bytes.to_vec(),
            format: format.to_string(),
        })
    }

    fn payload(&self, item: &SourceItem, content: &SourceContent, _position: u64) -> Payload {
        let mut payload = Payload::new();
        payload.insert("image_name".to_string(), json!(item.name));
        payload.insert(
            "created_at_utc".to_string(),
            json!(Utc::now().to_rfc3339()),
        );
        if let SourceContent::Image { bytes, format } = content {
            payload.insert("format".to_string(), json!(format));
            payload.insert(
                "image_in_base64_string".to_string(),
                json!(STANDARD.encode(bytes)),
            );
        }
        payload
    }
}
