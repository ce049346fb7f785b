use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::submissions::entities::Attachment;

static ATTACHMENT_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("Invalid attachment URL regex"));

/// 评语最少字符数（去除首尾空白后）
pub const MIN_FEEDBACK_CHARS: usize = 10;

pub fn validate_title(title: &str) -> Result<(), &'static str> {
    let len = title.trim().chars().count();
    if len == 0 {
        return Err("Title must not be empty");
    }
    if len > 200 {
        return Err("Title must be at most 200 characters");
    }
    Ok(())
}

pub fn validate_feedback(feedback: &str) -> Result<(), &'static str> {
    if feedback.trim().chars().count() < MIN_FEEDBACK_CHARS {
        return Err("Feedback must be at least 10 characters");
    }
    Ok(())
}

/// 分数必须是有限值且位于 [0, max]
pub fn validate_score(value: f64, max: f64) -> bool {
    value.is_finite() && value >= 0.0 && value <= max
}

pub fn validate_attachment(attachment: &Attachment) -> Result<(), String> {
    if attachment.name.trim().is_empty() {
        return Err("Attachment name must not be empty".to_string());
    }
    if !ATTACHMENT_URL_RE.is_match(&attachment.url) {
        return Err(format!("Attachment '{}' has an invalid URL", attachment.name));
    }
    if attachment.file_size < 0 {
        return Err(format!(
            "Attachment '{}' has a negative file size",
            attachment.name
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(url: &str) -> Attachment {
        Attachment {
            name: "essay.pdf".to_string(),
            url: url.to_string(),
            file_type: "application/pdf".to_string(),
            file_size: 1024,
        }
    }

    #[test]
    fn test_feedback_length_is_trimmed() {
        assert!(validate_feedback("   short   ").is_err());
        assert!(validate_feedback("  Nice structure overall  ").is_ok());
        assert!(validate_feedback("0123456789").is_ok());
    }

    #[test]
    fn test_score_bounds() {
        assert!(validate_score(0.0, 100.0));
        assert!(validate_score(100.0, 100.0));
        assert!(!validate_score(100.5, 100.0));
        assert!(!validate_score(-1.0, 100.0));
        assert!(!validate_score(f64::NAN, 100.0));
        assert!(!validate_score(f64::INFINITY, 100.0));
    }

    #[test]
    fn test_attachment_url() {
        assert!(validate_attachment(&attachment("https://blob.example.com/a/essay.pdf")).is_ok());
        assert!(validate_attachment(&attachment("ftp://blob.example.com/essay.pdf")).is_err());
        assert!(validate_attachment(&attachment("not a url")).is_err());
    }

    #[test]
    fn test_title() {
        assert!(validate_title("Essay 1").is_ok());
        assert!(validate_title("   ").is_err());
    }
}
