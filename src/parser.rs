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

use serde_json::Value;

use crate::domain::ComparisonSpecification;
use crate::error::ComparatorError;

pub(crate) fn parse_specification(text: &str) -> Result<ComparisonSpecification, ComparatorError> {
    serde_json::from_str(text).map_err(ComparatorError::Specification)
}

pub(crate) fn parse_actual(text: &str) -> Result<Value, ComparatorError> {
    serde_json::from_str(text).map_err(ComparatorError::ActualJson)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_specification() {
        let spec = parse_specification(
            r#"{
                "rules": [
                    { "selector": { "path": "$.list" }, "action": "set" },
                    { "selector": { "path": "$.id" }, "action": "matches", "pattern": "\\d+" }
                ],
                "templateJson": { "list": [1, 2], "id": 0 }
            }"#,
        )
        .unwrap();

        let rules = spec.rules();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].selector.path, "$.list");
        assert_eq!(rules[0].action, "set");
        assert_eq!(rules[0].pattern, None);
        assert_eq!(rules[1].pattern.as_deref(), Some("\\d+"));
        assert_eq!(spec.template_json, Some(json!({ "list": [1, 2], "id": 0 })));
    }

    #[test]
    fn test_parse_invalid_documents() {
        assert!(matches!(
            parse_specification("{ \"rules\": 1 }"),
            Err(ComparatorError::Specification(_))
        ));
        assert!(matches!(
            parse_specification("not json"),
            Err(ComparatorError::Specification(_))
        ));
        assert!(matches!(
            parse_actual("[1, 2"),
            Err(ComparatorError::ActualJson(_))
        ));
        assert_eq!(parse_actual(" null ").unwrap(), Value::Null);
    }
}
