pub mod init;
pub mod items;
pub mod list;

/// Command output; printed as JSON
pub type Output = serde_json::Value;
