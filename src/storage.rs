//! Destination store client: Google Drive v3 folders and files over REST.
//!
//! The client is constructed once at startup from environment credentials
//! (refresh-token exchange); every later call reuses the resulting access
//! token. Files written here carry the originating page identifier in
//! `appProperties`, which is the reconciliation key for later runs.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::contract::{NewDocument, Storage, StorageError, StoredDocument};

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const PDF_MIME_TYPE: &str = "application/pdf";

/// `appProperties` key carrying the originating page identifier.
pub const SOURCE_PAGE_ID_KEY: &str = "sourcePageId";

pub struct DriveClient {
    client: reqwest::Client,
    access_token: String,
    root_folder_id: String,
}

impl DriveClient {
    /// Exchanges the configured refresh token for an access token and returns
    /// a connected client. Required env: `GOOGLE_CLIENT_ID`,
    /// `GOOGLE_CLIENT_SECRET`, `GOOGLE_REFRESH_TOKEN`,
    /// `DRIVE_PARENT_FOLDER_ID`. Failure here is fatal to the run; there is
    /// nothing meaningful to do without credentials.
    pub async fn connect_from_env() -> Result<Self, StorageError> {
        let client_id = required_env("GOOGLE_CLIENT_ID")?;
        let client_secret = required_env("GOOGLE_CLIENT_SECRET")?;
        let refresh_token = required_env("GOOGLE_REFRESH_TOKEN")?;
        let root_folder_id = required_env("DRIVE_PARENT_FOLDER_ID")?;

        let client = reqwest::Client::new();
        let params = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let resp = client.post(OAUTH_TOKEN_URL).form(&params).send().await?;
        let status = resp.status();
        let body: serde_json::Value = resp.json().await?;
        if !status.is_success() {
            error!(status = %status, "Token refresh rejected by OAuth endpoint");
            return Err(format!("token refresh failed with status {status}: {body}").into());
        }
        let access_token = body
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or("token refresh response missing access_token")?
            .to_string();
        info!(root_folder_id = %root_folder_id, "Authenticated against destination store");
        Ok(Self {
            client,
            access_token,
            root_folder_id,
        })
    }

    /// The fixed top-level destination folder all per-root folders live under.
    pub fn root_folder_id(&self) -> &str {
        &self.root_folder_id
    }
}

fn required_env(key: &str) -> Result<String, StorageError> {
    std::env::var(key).map_err(|e| {
        error!(key, "Required environment variable missing");
        format!("{key} missing in environment: {e}").into()
    })
}

/// Values are embedded in single-quoted Drive query strings.
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

async fn check_json(resp: reqwest::Response) -> Result<serde_json::Value, StorageError> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp
            .text()
            .await
            .unwrap_or_else(|_| String::from("<failed to decode response body>"));
        return Err(format!("destination store returned {status}: {text}").into());
    }
    Ok(resp.json().await?)
}

fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl Storage for DriveClient {
    async fn find_folder(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<String>, StorageError> {
        let query = format!(
            "name = '{}' and '{}' in parents and mimeType = '{}' and trashed = false",
            escape_query_value(name),
            escape_query_value(parent_id),
            FOLDER_MIME_TYPE
        );
        let resp = self
            .client
            .get(DRIVE_FILES_URL)
            .query(&[("q", query.as_str()), ("fields", "files(id, name)")])
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let body = check_json(resp).await?;
        let id = body
            .get("files")
            .and_then(|v| v.as_array())
            .and_then(|files| files.first())
            .and_then(|f| f.get("id"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        debug!(name, parent_id, found = id.is_some(), "Looked up destination folder by name");
        Ok(id)
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, StorageError> {
        let metadata = serde_json::json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent_id],
        });
        let resp = self
            .client
            .post(DRIVE_FILES_URL)
            .query(&[("fields", "id")])
            .bearer_auth(&self.access_token)
            .json(&metadata)
            .send()
            .await?;
        let body = check_json(resp).await?;
        let id = body
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or("create folder response missing id")?
            .to_string();
        info!(name, folder_id = %id, "Created destination folder");
        Ok(id)
    }

    async fn find_document(
        &self,
        source_page_id: &str,
        parent_id: &str,
    ) -> Result<Option<StoredDocument>, StorageError> {
        let query = format!(
            "appProperties has {{ key = '{}' and value = '{}' }} and '{}' in parents and trashed = false",
            SOURCE_PAGE_ID_KEY,
            escape_query_value(source_page_id),
            escape_query_value(parent_id)
        );
        let resp = self
            .client
            .get(DRIVE_FILES_URL)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id, name, appProperties)"),
            ])
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let body = check_json(resp).await?;
        let files = body
            .get("files")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        if files.len() > 1 {
            warn!(
                source_page_id,
                count = files.len(),
                "Multiple destination files linked to one page id, using the first"
            );
        }
        let stored = files.first().map(|f| StoredDocument {
            file_id: f
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            name: f
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            source_page_id: f
                .get("appProperties")
                .and_then(|p| p.get(SOURCE_PAGE_ID_KEY))
                .and_then(|v| v.as_str())
                .map(str::to_string),
        });
        debug!(source_page_id, found = stored.is_some(), "Looked up destination file by page id");
        Ok(stored)
    }

    async fn create_document<'a>(&self, req: NewDocument<'a>) -> Result<String, StorageError> {
        let metadata = serde_json::json!({
            "name": req.name,
            "parents": [req.parent_id],
            "appProperties": { SOURCE_PAGE_ID_KEY: req.source_page_id },
        });
        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata.to_string())
                    .mime_str("application/json")?,
            )
            .part(
                "media",
                reqwest::multipart::Part::bytes(req.content.to_vec()).mime_str(PDF_MIME_TYPE)?,
            );
        let resp = self
            .client
            .post(DRIVE_UPLOAD_URL)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await?;
        let body = check_json(resp).await?;
        let id = body
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or("create file response missing id")?
            .to_string();
        info!(
            name = req.name,
            source_page_id = req.source_page_id,
            file_id = %id,
            content_hash = %content_hash(req.content),
            "Created destination document"
        );
        Ok(id)
    }

    async fn update_document(
        &self,
        file_id: &str,
        name: &str,
        content: &[u8],
    ) -> Result<(), StorageError> {
        let metadata = serde_json::json!({ "name": name });
        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata.to_string())
                    .mime_str("application/json")?,
            )
            .part(
                "media",
                reqwest::multipart::Part::bytes(content.to_vec()).mime_str(PDF_MIME_TYPE)?,
            );
        let resp = self
            .client
            .patch(format!("{DRIVE_UPLOAD_URL}/{file_id}"))
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await?;
        check_json(resp).await?;
        info!(
            file_id,
            name,
            content_hash = %content_hash(content),
            "Updated destination document in place"
        );
        Ok(())
    }
}
