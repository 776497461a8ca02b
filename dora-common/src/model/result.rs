// dora-common/src/model/result.rs
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reply of the upload endpoint. Passed through to the user, never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    #[serde(default, alias = "ret")]
    pub code: Option<serde_json::Value>,
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
}

impl OperationResult {
    /// Parses a reply body; anything that is not the expected JSON becomes the message.
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| Self {
            code: None,
            message: Some(body.trim().to_string()).filter(|s| !s.is_empty()),
        })
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self
            .code
            .as_ref()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "code={code}, message={}",
            self.message.as_deref().unwrap_or("-")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_both_field_spellings() {
        let a = OperationResult::from_body(r#"{"code": 0, "message": "ok"}"#);
        let b = OperationResult::from_body(r#"{"ret": 0, "msg": "ok"}"#);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "code=0, message=ok");
    }

    #[test]
    fn non_json_body_is_passed_through() {
        let r = OperationResult::from_body("uploaded\n");
        assert!(r.code.is_none());
        assert_eq!(r.message.as_deref(), Some("uploaded"));
    }
}
