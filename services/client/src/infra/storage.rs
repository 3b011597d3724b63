use reqwest::Method;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};

use crate::domain::repository::FileStorage;
use crate::domain::types::PhotoUpload;
use crate::error::ClientError;
use crate::infra::rest::RestClient;

/// Object storage bucket on the hosted backend.
#[derive(Clone)]
pub struct BucketStorage {
    pub client: RestClient,
    pub bucket: String,
}

impl BucketStorage {
    fn object_path(&self, path: &str) -> String {
        format!("{}/{}", self.bucket, path.trim_start_matches('/'))
    }
}

impl FileStorage for BucketStorage {
    async fn upload(&self, path: &str, upload: &PhotoUpload) -> Result<(), ClientError> {
        let url = self
            .client
            .url(&format!("/storage/v1/object/{}", self.object_path(path)))?;
        let req = self
            .client
            .request(Method::POST, url)
            .header(CONTENT_TYPE, upload.content_type.as_str())
            .header(CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "true")
            .body(upload.bytes.clone());
        self.client.send(req, "upload photo").await?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}",
            self.client.base_url(),
            self.object_path(path)
        )
    }
}
