use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateClassRequest {
    pub class_name: String,
    pub description: Option<String>,
    pub teacher_id: i64,
}
