//! Wire message definitions for the LanShare HTTP API.
//!
//! Every body exchanged over `/api/*` is defined here. Responses are plain
//! JSON objects (or arrays of them); field names are camelCase.

use serde::{Deserialize, Serialize};

/// MIME sentinel reported for directories.
pub const FOLDER_MIME_TYPE: &str = "folder";

/// MIME type used when nothing better can be guessed from a file name.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

// =============================================================================
// Admin messages
// =============================================================================

/// Request to share a file or directory on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    /// Host path of the file or directory to share.
    pub target_path: String,
}

impl ShareRequest {
    /// Create a share request for the given host path.
    pub fn new(target_path: impl Into<String>) -> Self {
        Self {
            target_path: target_path.into(),
        }
    }
}

/// Response to a share request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    /// Always `true` on a 2xx response.
    pub success: bool,
    /// Number of root shares after the operation.
    pub count: usize,
    /// Identifier of the (new or existing) share.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Whether a new share was created (`false` for a duplicate).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,
    /// Informational message, set for duplicates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response to a share removal. Removal always succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub success: bool,
}

/// Request to browse a directory of the host filesystem (admin picker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseRequest {
    #[serde(default)]
    pub path: Option<String>,
}

/// One entry of a host directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseEntry {
    pub name: String,
    pub is_directory: bool,
    /// Absolute host path, usable as the next `BrowseRequest` or `ShareRequest`.
    pub path: String,
}

/// Answer to the admin check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatus {
    pub is_admin: bool,
}

// =============================================================================
// Public messages
// =============================================================================

/// A root-level shared item as listed by `GET /api/files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootItem {
    pub id: String,
    pub name: String,
    /// Byte length for files, 0 for directories.
    pub size: u64,
    /// MIME type, or [`FOLDER_MIME_TYPE`] for directories.
    #[serde(rename = "type")]
    pub mime_type: String,
    pub is_directory: bool,
}

/// Listing of one directory inside a shared folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderListing {
    /// Display name of the shared folder.
    pub folder_name: String,
    /// Subpath that was listed, relative to the shared folder.
    pub current_path: String,
    pub items: Vec<FolderItem>,
    /// Number of children omitted because they could not be inspected.
    #[serde(default)]
    pub skipped: usize,
}

/// One child inside a [`FolderListing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderItem {
    pub name: String,
    /// Path relative to the shared folder; feed it back as `?path=`.
    pub path: String,
    pub is_directory: bool,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Result of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    /// Names under which the files were stored.
    pub files: Vec<String>,
}

// =============================================================================
// Discovery messages
// =============================================================================

/// LAN addresses the server can be reached on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpInfo {
    pub ips: Vec<String>,
    pub port: u16,
}

/// QR code of the share URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCodeResponse {
    /// PNG image as a `data:` URL.
    pub qr: String,
    pub url: String,
}

// =============================================================================
// Errors
// =============================================================================

/// Body of every non-2xx JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_share_request_wire_format() {
        let parsed: ShareRequest =
            serde_json::from_value(json!({ "targetPath": "C:\\Users\\me\\Music" })).unwrap();
        assert_eq!(parsed.target_path, "C:\\Users\\me\\Music");
    }

    #[test]
    fn test_share_request_missing_path_rejected() {
        let result: Result<ShareRequest, _> = serde_json::from_value(json!({}));
        assert!(result.is_err());
    }

    #[test]
    fn test_share_response_omits_unset_fields() {
        let response = ShareResponse {
            success: true,
            count: 3,
            id: None,
            created: None,
            message: None,
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "success": true, "count": 3 })
        );
    }

    #[test]
    fn test_share_response_duplicate_shape() {
        let response = ShareResponse {
            success: true,
            count: 1,
            id: Some("abc".to_string()),
            created: Some(false),
            message: Some("Already shared".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "success": true,
                "count": 1,
                "id": "abc",
                "created": false,
                "message": "Already shared"
            })
        );
    }

    #[test]
    fn test_root_item_uses_type_key() {
        let item = RootItem {
            id: "1".to_string(),
            name: "report.pdf".to_string(),
            size: 2048,
            mime_type: "application/pdf".to_string(),
            is_directory: false,
        };
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({
                "id": "1",
                "name": "report.pdf",
                "size": 2048,
                "type": "application/pdf",
                "isDirectory": false
            })
        );
    }

    #[test]
    fn test_folder_listing_wire_format() {
        let listing = FolderListing {
            folder_name: "Photos".to_string(),
            current_path: "2024".to_string(),
            items: vec![FolderItem {
                name: "beach".to_string(),
                path: "2024/beach".to_string(),
                is_directory: true,
                size: 0,
                mime_type: FOLDER_MIME_TYPE.to_string(),
            }],
            skipped: 1,
        };
        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["folderName"], "Photos");
        assert_eq!(value["currentPath"], "2024");
        assert_eq!(value["items"][0]["isDirectory"], true);
        assert_eq!(value["items"][0]["type"], "folder");
        assert_eq!(value["skipped"], 1);
    }

    #[test]
    fn test_folder_listing_skipped_defaults_to_zero() {
        let listing: FolderListing = serde_json::from_value(json!({
            "folderName": "x",
            "currentPath": "",
            "items": []
        }))
        .unwrap();
        assert_eq!(listing.skipped, 0);
    }

    #[test]
    fn test_browse_request_path_optional() {
        let request: BrowseRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.path.is_none());
    }

    #[test]
    fn test_admin_status_wire_format() {
        assert_eq!(
            serde_json::to_value(AdminStatus { is_admin: true }).unwrap(),
            json!({ "isAdmin": true })
        );
    }

    #[test]
    fn test_error_body() {
        assert_eq!(
            serde_json::to_value(ErrorBody::new("Access denied")).unwrap(),
            json!({ "error": "Access denied" })
        );
    }
}
