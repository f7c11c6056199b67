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

use std::fmt;

use serde_json::Value;

use crate::rules::CompiledRule;

/// The nodes found at the error path of a failed comparison, and the rule applied there.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureDetails {
    pub(crate) actual_element: Option<Value>,
    pub(crate) template_element: Option<Value>,
    pub(crate) matching_rule: Option<CompiledRule>,
}

impl FailureDetails {
    /// Node of the actual document at the error path, if it exists there.
    pub fn actual_element(&self) -> Option<&Value> {
        self.actual_element.as_ref()
    }

    /// Node of the template document at the error path, if it exists there.
    pub fn template_element(&self) -> Option<&Value> {
        self.template_element.as_ref()
    }

    /// Rule whose selector matched the error path, if any.
    pub fn matching_rule(&self) -> Option<&CompiledRule> {
        self.matching_rule.as_ref()
    }
}

trait Indent {
    fn indent(&self, level: usize) -> String;
}

impl<T> Indent for T
where
    T: ToString,
{
    fn indent(&self, level: usize) -> String {
        let indent = " ".repeat(level);

        self.to_string()
            .lines()
            .map(|line| format!("{}{}", indent, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for FailureDetails {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let json_to_string = |json: &Option<Value>| match json {
            Some(json) => format!("{:#}", json).indent(8),
            None => "(missing)".indent(8),
        };

        writeln!(f, "    expected:")?;
        writeln!(f, "{}", json_to_string(&self.template_element))?;
        writeln!(f, "    actual:")?;
        write!(f, "{}", json_to_string(&self.actual_element))?;
        if let Some(rule) = &self.matching_rule {
            write!(f, "\n    rule: {}", rule)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domain::RuleSpecification;
    use crate::rules::RegexMatch;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_indent() {
        assert_eq!("  foo", "foo".indent(2));
        assert_eq!("  foo\n  bar", "foo\nbar".indent(2));
    }

    #[test]
    fn test_display() {
        let details = FailureDetails {
            actual_element: Some(json!({ "a": 1 })),
            template_element: None,
            matching_rule: Some(CompiledRule::new(
                Arc::new(RegexMatch::default()),
                RuleSpecification::new("$.a", "matches").with_pattern("x"),
            )),
        };

        assert_eq!(
            details.to_string(),
            "    expected:\n        (missing)\n    actual:\n        {\n          \"a\": 1\n        }\n    rule: matches on $.a with pattern 'x'"
        );
    }
}
