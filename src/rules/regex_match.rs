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

use std::borrow::Cow;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use super::{ChildComparator, Rule};
use crate::domain::{ComparisonOutcome, Depth, RuleSpecification};
use crate::error::ComparatorError;

/// Accepts the actual value when its string form matches the rule's pattern as a whole.
///
/// The template value at the path is ignored. The registered instance is unbound; compiling
/// a `matches` specification binds a copy holding the anchored pattern.
#[derive(Debug, Clone, Default)]
pub struct RegexMatch {
    regex: Option<Regex>,
}

impl RegexMatch {
    /// Compiles the pattern of `specification` into a bound rule.
    pub fn for_specification(specification: &RuleSpecification) -> Result<Self, ComparatorError> {
        Ok(Self {
            regex: Some(Self::regex(specification)?),
        })
    }

    fn regex(specification: &RuleSpecification) -> Result<Regex, ComparatorError> {
        let invalid = |reason: String| ComparatorError::InvalidRule {
            action: specification.action.clone(),
            reason,
        };

        let pattern = specification
            .pattern
            .as_deref()
            .ok_or_else(|| invalid("a pattern is required".to_string()))?;

        // the pattern must stand alone, `a)|(b` would escape the anchoring group
        Regex::new(pattern).map_err(|err| invalid(err.to_string()))?;

        Regex::new(&format!("^(?:{})$", pattern)).map_err(|err| invalid(err.to_string()))
    }
}

impl Rule for RegexMatch {
    fn compare(
        &self,
        path: &str,
        _template: &Value,
        actual: &Value,
        specification: &RuleSpecification,
        _children: &dyn ChildComparator,
    ) -> ComparisonOutcome {
        let value = string_for_comparison(actual);

        let regex = match &self.regex {
            Some(regex) => Cow::Borrowed(regex),
            None => match Self::regex(specification) {
                Ok(regex) => Cow::Owned(regex),
                Err(err) => {
                    return ComparisonOutcome::mismatch(Depth::Shallow, err.to_string(), path)
                }
            },
        };

        if regex.is_match(&value) {
            ComparisonOutcome::matched(Depth::Shallow)
        } else {
            ComparisonOutcome::mismatch(
                Depth::Shallow,
                format!(
                    "value at path {} does not match '{}': value={}",
                    path,
                    specification.pattern.as_deref().unwrap_or_default(),
                    value
                ),
                path,
            )
        }
    }

    fn bind(
        &self,
        specification: &RuleSpecification,
    ) -> Result<Option<Arc<dyn Rule>>, ComparatorError> {
        Ok(Some(Arc::new(Self::for_specification(specification)?)))
    }
}

/// Strings compare by their content, other primitives and containers by their JSON text.
fn string_for_comparison(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}
