use serde::Deserialize;

use super::entities::Attachment;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitRequest {
    pub content: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}
