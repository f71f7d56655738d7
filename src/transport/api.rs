use serde::{Deserialize, Serialize};

// Request bodies

#[derive(Debug, Serialize)]
pub struct RecommendRequest<'a> {
    pub message: &'a str,
    pub user_email: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct ChatLogRequest<'a> {
    pub user_email: &'a str,
    pub message: &'a str,
    pub sender: &'a str,
}

#[derive(Debug, Serialize)]
pub struct MoodLogRequest<'a> {
    pub user_email: &'a str,
    pub mood: &'a str,
    pub intensity: i64,
}

#[derive(Debug, Serialize)]
pub struct SymptomLogRequest<'a> {
    pub user_email: &'a str,
    pub symptom: &'a str,
    pub severity: i64,
}

#[derive(Debug, Serialize)]
pub struct MealLogRequest<'a> {
    pub user_email: &'a str,
    pub meal_type: &'a str,
    pub items: &'a [String],
}

// Response bodies

#[derive(Debug, Deserialize)]
pub struct RecommendResponse {
    #[serde(default)]
    pub result: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recommend_request_sends_null_email_when_signed_out() {
        let body = RecommendRequest {
            message: "hello",
            user_email: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"message": "hello", "user_email": null})
        );
    }

    #[test]
    fn meal_request_uses_snake_case_keys() {
        let items = vec!["rice".to_string(), "dal".to_string()];
        let body = MealLogRequest {
            user_email: "a@b.c",
            meal_type: "Lunch",
            items: &items,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"user_email": "a@b.c", "meal_type": "Lunch", "items": ["rice", "dal"]})
        );
    }

    #[test]
    fn recommend_response_tolerates_missing_or_null_result() {
        let missing: RecommendResponse = serde_json::from_str("{}").unwrap();
        assert!(missing.result.is_none());
        let null: RecommendResponse = serde_json::from_str(r#"{"result": null}"#).unwrap();
        assert!(null.result.is_none());
        let text: RecommendResponse = serde_json::from_str(r#"{"result": "Drink warm water."}"#).unwrap();
        assert_eq!(text.result.as_deref(), Some("Drink warm water."));
    }
}
