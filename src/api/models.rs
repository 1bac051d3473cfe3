use crate::api::TagsResponse;
use crate::utils::url::construct_api_url;

/// Fetch the daemon's advertised models via `GET /api/tags`.
///
/// Failures are returned to the caller; the controller substitutes the
/// configured fallback model instead of surfacing them to the user.
pub async fn fetch_models(
    client: &reqwest::Client,
    host: &str,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let tags_url = construct_api_url(host, "api/tags");
    let response = client.get(tags_url).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(format!("model list request failed with status {status}: {error_text}").into());
    }

    let tags = response.json::<TagsResponse>().await?;
    Ok(tags.models.into_iter().map(|m| m.name).collect())
}

/// Sort model names for consistent picker display.
pub fn sort_models(models: &mut [String]) {
    models.sort_unstable();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_response_extracts_names() {
        let body = r#"{"models":[
            {"name":"llama3.2:latest","modified_at":"2024-11-01T10:00:00Z","size":2019393189},
            {"name":"mistral:7b"}
        ]}"#;
        let tags: TagsResponse = serde_json::from_str(body).unwrap();
        let names: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["llama3.2:latest", "mistral:7b"]);
    }

    #[test]
    fn sort_models_orders_names() {
        let mut models = vec![
            "mistral:7b".to_string(),
            "llama3.2:latest".to_string(),
            "qwen2.5:3b".to_string(),
        ];
        sort_models(&mut models);
        assert_eq!(models, vec!["llama3.2:latest", "mistral:7b", "qwen2.5:3b"]);
    }
}
