// Copyright 2024 The DocAssert Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Retrieval of the actual document from a live HTTP endpoint.

use std::collections::HashMap;
use std::str::FromStr;

use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};

use crate::domain::ComparisonOutcome;
use crate::error::ComparatorError;
use crate::JsonComparator;

/// Fetches the body of `url` with a GET request.
///
/// A `204 No Content` response or an empty body yields `None`, an absent actual document.
/// Any other non-success status is an error.
pub async fn fetch_actual(
    url: &str,
    headers: &HashMap<String, String>,
) -> Result<Option<String>, ComparatorError> {
    let fetch_error = |reason: String| ComparatorError::Fetch {
        url: url.to_string(),
        reason,
    };

    let response = Client::new()
        .get(url)
        .headers(map_headers(headers).map_err(fetch_error)?)
        .send()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    let status = response.status();
    debug!("GET {} responded with {}", url, status);

    if !status.is_success() {
        return Err(fetch_error(format!("unexpected response code {}", status.as_u16())));
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    let body = response.text().await.map_err(|e| fetch_error(e.to_string()))?;
    if body.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(body))
    }
}

/// Fetches the actual document from `url` and compares it with the specification.
pub async fn compare_url(
    comparator: &JsonComparator,
    comparison_spec: &str,
    url: &str,
    headers: &HashMap<String, String>,
) -> Result<ComparisonOutcome, ComparatorError> {
    let actual = fetch_actual(url, headers).await?;
    comparator.compare(comparison_spec, actual.as_deref())
}

fn map_headers(headers: &HashMap<String, String>) -> Result<HeaderMap, String> {
    let mut header_map = HeaderMap::new();
    for (key, value) in headers {
        let header_name = HeaderName::from_str(key.as_str()).map_err(|e| e.to_string())?;
        let header_value = HeaderValue::from_str(value.as_str()).map_err(|e| e.to_string())?;
        header_map.insert(header_name, header_value);
    }
    Ok(header_map)
}

#[cfg(test)]
mod test {
    use super::*;

    const SPEC: &str = r#"{
        "rules": [ { "selector": { "path": "$.id" }, "action": "matches", "pattern": "\\d+" } ],
        "templateJson": { "id": 0, "name": "John" }
    }"#;

    fn auth_headers() -> HashMap<String, String> {
        vec![("Authorization".to_string(), "Bearer abcd".to_string())]
            .into_iter()
            .collect()
    }

    #[tokio::test]
    async fn test_compare_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/1")
            .match_header("Authorization", "Bearer abcd")
            .with_header("Content-Type", "application/json")
            .with_status(200)
            .with_body(r#"{"id": 17, "name": "John"}"#)
            .create_async()
            .await;

        let url = format!("{}/users/1", server.url());
        let outcome = compare_url(&JsonComparator::new(), SPEC, &url, &auth_headers())
            .await
            .unwrap();

        assert!(outcome.is_match(), "{}", outcome);
    }

    #[tokio::test]
    async fn test_compare_url_mismatch() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/1")
            .with_status(200)
            .with_body(r#"{"id": "x", "name": "John"}"#)
            .create_async()
            .await;

        let url = format!("{}/users/1", server.url());
        let outcome = compare_url(&JsonComparator::new(), SPEC, &url, &HashMap::new())
            .await
            .unwrap();

        assert!(!outcome.is_match());
        assert_eq!(outcome.error_path(), Some("$['id']"));
    }

    #[tokio::test]
    async fn test_fetch_empty_body_is_absent() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/empty")
            .with_status(204)
            .create_async()
            .await;

        let url = format!("{}/empty", server.url());
        assert_eq!(fetch_actual(&url, &HashMap::new()).await.unwrap(), None);

        let outcome = compare_url(&JsonComparator::new(), SPEC, &url, &HashMap::new())
            .await
            .unwrap();
        assert!(!outcome.is_match());
        assert_eq!(
            outcome.message(),
            Some("actual json is null; template json is not")
        );
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/missing", server.url());
        let err = fetch_actual(&url, &HashMap::new()).await.unwrap_err();

        assert!(matches!(err, ComparatorError::Fetch { .. }));
        assert!(err.to_string().contains("unexpected response code 404"));
    }

    #[tokio::test]
    async fn test_fetch_invalid_header() {
        let headers = vec![("Bad Header".to_string(), "x".to_string())]
            .into_iter()
            .collect();

        let err = fetch_actual("http://localhost:1", &headers)
            .await
            .unwrap_err();

        assert!(matches!(err, ComparatorError::Fetch { .. }));
    }
}
