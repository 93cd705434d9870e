//! API response types and extractors

pub mod extract;
pub mod response;

pub use extract::JsonBody;
pub use response::{Created, DataResponse, MarkdownAttachment, NoContent};
