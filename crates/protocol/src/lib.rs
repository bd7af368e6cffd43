//! # LanShare Protocol Library
//!
//! This crate defines the JSON wire contract spoken between the LanShare
//! server and its browser clients (the admin dashboard and the receiver UI).
//!
//! ## Overview
//!
//! - **Admin messages**: adding and removing shares, browsing the host filesystem
//! - **Public messages**: root share listing, folder listing, upload results
//! - **Discovery messages**: LAN addresses and the share URL QR code
//! - **Error body**: the single `{ "error": "..." }` shape every failure uses
//!
//! All field names are camelCase on the wire.
//!
//! ## Example Usage
//!
//! ```rust
//! use protocol::messages::ShareRequest;
//!
//! let request = ShareRequest::new("/home/user/Videos");
//! let json = protocol::encode(&request).unwrap();
//! assert_eq!(json, r#"{"targetPath":"/home/user/Videos"}"#);
//!
//! let back: ShareRequest = protocol::decode(&json).unwrap();
//! assert_eq!(back, request);
//! ```
//!
//! ## Modules
//!
//! - [`messages`]: Request and response bodies
//! - [`error`]: Error types

pub mod error;
pub mod messages;

pub use error::{ProtocolError, Result};
pub use messages::{
    AdminStatus, BrowseEntry, BrowseRequest, ErrorBody, FolderItem, FolderListing, IpInfo,
    QrCodeResponse, RemoveResponse, RootItem, ShareRequest, ShareResponse, UploadResponse,
    DEFAULT_MIME_TYPE, FOLDER_MIME_TYPE,
};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serialize a wire message to its JSON text form.
pub fn encode<T: Serialize>(message: &T) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// Parse a wire message from JSON text.
pub fn decode<T: DeserializeOwned>(json: &str) -> Result<T> {
    Ok(serde_json::from_str(json)?)
}

/// Parse a wire message from a raw response body.
pub fn decode_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}
