use super::task::id_from_string_or_number;
use serde::{Deserialize, Serialize};

/// Carousel highlight as returned by `GET /highlights`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub image_path: String,
    #[serde(default)]
    pub task_description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_highlight() {
        let h: Highlight = serde_json::from_str(
            r#"{"id": 3, "image_path": "uploads/beach.jpg", "task_description": "Finished the report"}"#,
        )
        .unwrap();
        assert_eq!(h.id, "3");
        assert_eq!(h.image_path, "uploads/beach.jpg");
        assert_eq!(h.task_description, "Finished the report");
    }
}
