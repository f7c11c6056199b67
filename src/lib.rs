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

#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

use log::debug;
use serde_json::Value;

pub use crate::details::FailureDetails;
pub use crate::domain::{
    ComparisonOutcome, ComparisonSpecification, Depth, RuleSelector, RuleSpecification,
};
pub use crate::error::ComparatorError;

use crate::json_path::{select_one, ROOT};
use crate::processor::{ComparisonProcessor, RuleProcessor};
use crate::rules::{Rule, RuleCompiler, RuleRegistry};

mod details;
mod domain;
mod error;
pub mod executor;
pub mod json_path;
mod parser;
mod processor;
pub mod rules;

/// Compares actual JSON documents against the template of a comparison specification.
///
/// The comparator only holds the rule registry, it is immutable once built and can be
/// shared between threads. Every comparison builds its own processing state.
///
/// # Examples
///
/// ```
/// use json_comparator::JsonComparator;
///
/// let spec = r#"{
///     "rules": [ { "selector": { "path": "$[2]" }, "action": "matches", "pattern": "[3-5]" } ],
///     "templateJson": [1, 2, 3]
/// }"#;
///
/// let comparator = JsonComparator::new();
///
/// let outcome = comparator.compare(spec, Some("[1, 2, 4]")).unwrap();
/// assert!(outcome.is_match());
///
/// let outcome = comparator.compare(spec, Some("[1, 2, 6]")).unwrap();
/// assert_eq!(outcome.error_path(), Some("$[2]"));
/// ```
#[derive(Debug, Clone)]
pub struct JsonComparator {
    compiler: RuleCompiler,
}

impl JsonComparator {
    /// Constructs a comparator knowing the built-in `matches` and `set` rules.
    ///
    /// # Examples
    ///
    /// ```
    /// use json_comparator::JsonComparator;
    /// let comparator = JsonComparator::new();
    /// ```
    pub fn new() -> Self {
        Self {
            compiler: RuleCompiler::new(RuleRegistry::with_builtin_rules()),
        }
    }

    /// Registers an additional rule under `action`, replacing any rule of that name.
    ///
    /// # Examples
    ///
    /// ```
    /// use json_comparator::rules::{ChildComparator, Rule};
    /// use json_comparator::{ComparisonOutcome, Depth, JsonComparator, RuleSpecification};
    /// use serde_json::Value;
    ///
    /// #[derive(Debug)]
    /// struct Anything;
    ///
    /// impl Rule for Anything {
    ///     fn compare(
    ///         &self,
    ///         _path: &str,
    ///         _template: &Value,
    ///         _actual: &Value,
    ///         _specification: &RuleSpecification,
    ///         _children: &dyn ChildComparator,
    ///     ) -> ComparisonOutcome {
    ///         ComparisonOutcome::matched(Depth::Deep)
    ///     }
    /// }
    ///
    /// let comparator = JsonComparator::new().with_rule("anything", Anything);
    /// let spec = r#"{
    ///     "rules": [ { "selector": { "path": "$.created" }, "action": "anything" } ],
    ///     "templateJson": { "created": null }
    /// }"#;
    ///
    /// let outcome = comparator
    ///     .compare(spec, Some(r#"{ "created": "2024-03-01T10:00:00Z" }"#))
    ///     .unwrap();
    /// assert!(outcome.is_match());
    /// ```
    pub fn with_rule(mut self, action: impl Into<String>, rule: impl Rule + 'static) -> Self {
        self.compiler.registry_mut().register(action, rule);
        self
    }

    /// Replaces the whole rule registry, built-in rules included.
    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.compiler = RuleCompiler::new(registry);
        self
    }

    pub fn registry(&self) -> &RuleRegistry {
        self.compiler.registry()
    }

    /// Compares the actual document against the specification's template.
    ///
    /// `None` stands for an absent actual document. Differences are reported in the returned
    /// outcome; only malformed input and unknown or invalid rules are errors.
    pub fn compare(
        &self,
        comparison_spec: &str,
        actual: Option<&str>,
    ) -> Result<ComparisonOutcome, ComparatorError> {
        let specification = parser::parse_specification(comparison_spec)?;
        let actual = actual.map(parser::parse_actual).transpose()?;

        self.compare_values(&specification, actual.as_ref())
    }

    /// Compares an already parsed actual document against a parsed specification.
    pub fn compare_values(
        &self,
        specification: &ComparisonSpecification,
        actual: Option<&Value>,
    ) -> Result<ComparisonOutcome, ComparatorError> {
        let (template, actual) = match (&specification.template_json, actual) {
            (None, Some(_)) => {
                return Ok(ComparisonOutcome::mismatch(
                    Depth::Shallow,
                    "template json is null; actual json is not",
                    ROOT,
                ))
            }
            (None, None) => return Ok(ComparisonOutcome::matched(Depth::Deep)),
            (Some(_), None) => {
                return Ok(ComparisonOutcome::mismatch(
                    Depth::Shallow,
                    "actual json is null; template json is not",
                    ROOT,
                ))
            }
            (Some(template), Some(actual)) => (template, actual),
        };

        debug!(
            "comparing json documents with {} rule specification(s)",
            specification.rules().len()
        );

        ComparisonProcessor::new(&self.compiler, template, specification.rules(), actual)
            .execute_comparison()
    }

    /// Looks up the template and actual nodes at the error path of `outcome`, along with
    /// the rule applied there.
    ///
    /// Returns `None` when the outcome carries no error path.
    ///
    /// # Examples
    ///
    /// ```
    /// use json_comparator::JsonComparator;
    /// use serde_json::json;
    ///
    /// let comparator = JsonComparator::new();
    /// let spec = r#"{ "templateJson": { "name": "John", "age": 30 } }"#;
    /// let actual = r#"{ "name": "John", "age": 31 }"#;
    ///
    /// let outcome = comparator.compare(spec, Some(actual)).unwrap();
    /// let details = comparator
    ///     .extract_failure_details(spec, Some(actual), &outcome)
    ///     .unwrap()
    ///     .unwrap();
    ///
    /// assert_eq!(details.template_element(), Some(&json!(30)));
    /// assert_eq!(details.actual_element(), Some(&json!(31)));
    /// assert!(details.matching_rule().is_none());
    /// ```
    pub fn extract_failure_details(
        &self,
        comparison_spec: &str,
        actual: Option<&str>,
        outcome: &ComparisonOutcome,
    ) -> Result<Option<FailureDetails>, ComparatorError> {
        let Some(error_path) = outcome.error_path() else {
            return Ok(None);
        };

        let specification = parser::parse_specification(comparison_spec)?;
        let actual = actual.map(parser::parse_actual).transpose()?;

        let resolve = |document: Option<&Value>| -> Result<Option<Value>, ComparatorError> {
            let Some(document) = document else {
                return Ok(None);
            };
            let node = select_one(error_path, document).map_err(|source| {
                ComparatorError::InvalidSelector {
                    selector: error_path.to_string(),
                    source,
                }
            })?;
            Ok(node.cloned())
        };

        let template_element = resolve(specification.template_json.as_ref())?;
        let actual_element = resolve(actual.as_ref())?;

        let matching_rule = match &actual {
            Some(actual) => {
                let mut rule_processor =
                    RuleProcessor::new(&self.compiler, specification.rules(), actual);
                rule_processor.init()?;
                rule_processor.find_matching_rule(error_path).cloned()
            }
            None => None,
        };

        Ok(Some(FailureDetails {
            actual_element,
            template_element,
            matching_rule,
        }))
    }
}

impl Default for JsonComparator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rules::ChildComparator;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    const REGEX_SPEC: &str = r#"{
        "rules": [ { "selector": { "path": "$[2]" }, "action": "matches", "pattern": "[3-5]" } ],
        "templateJson": [1, 2, 3]
    }"#;

    const SET_SPEC: &str = r#"{
        "rules": [ { "selector": { "path": "$" }, "action": "set" } ],
        "templateJson": [1, 2, 3, 4]
    }"#;

    fn fixture(name: &str) -> String {
        let path = format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name);
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {}", path, e))
    }

    #[test]
    fn test_null_documents() {
        let comparator = JsonComparator::new();

        let outcome = comparator.compare("{}", Some("{}")).unwrap();
        assert!(!outcome.is_match());
        assert_eq!(outcome.depth(), Depth::Shallow);
        assert_eq!(
            outcome.message(),
            Some("template json is null; actual json is not")
        );
        assert_eq!(outcome.error_path(), Some("$"));

        let outcome = comparator.compare(r#"{ "templateJson": null }"#, None).unwrap();
        assert!(outcome.is_match());
        assert!(outcome.is_deep());

        let outcome = comparator
            .compare(r#"{ "templateJson": { "a": 1 } }"#, None)
            .unwrap();
        assert!(!outcome.is_match());
        assert_eq!(outcome.depth(), Depth::Shallow);
        assert_eq!(
            outcome.message(),
            Some("actual json is null; template json is not")
        );
        assert_eq!(outcome.error_path(), Some("$"));
    }

    #[test]
    fn test_json_null_is_a_value() {
        let comparator = JsonComparator::new();

        let outcome = comparator
            .compare(r#"{ "templateJson": { "a": null } }"#, Some(r#"{ "a": null }"#))
            .unwrap();
        assert!(outcome.is_match());

        let outcome = comparator
            .compare(r#"{ "templateJson": 1 }"#, Some("null"))
            .unwrap();
        assert!(!outcome.is_match());
        assert_eq!(
            outcome.message(),
            Some("primitive mismatch at path $: actual=null; expected=1")
        );
    }

    #[test]
    fn test_regex_rule() {
        let comparator = JsonComparator::new();

        assert!(comparator.compare(REGEX_SPEC, Some("[1, 2, 4]")).unwrap().is_match());

        let outcome = comparator.compare(REGEX_SPEC, Some("[2, 4, 6]")).unwrap();
        assert!(!outcome.is_match());
        assert_eq!(outcome.error_path(), Some("$[2]"));
    }

    #[test]
    fn test_set_rule() {
        let comparator = JsonComparator::new();

        assert!(comparator.compare(SET_SPEC, Some("[4, 2, 3, 1]")).unwrap().is_match());

        let outcome = comparator.compare(SET_SPEC, Some("[4, 2, 3, 0]")).unwrap();
        assert!(!outcome.is_match());
        assert_eq!(outcome.error_path(), Some("$[3]"));
    }

    #[test]
    fn test_compare_is_idempotent() {
        let comparator = JsonComparator::new();

        let first = comparator.compare(SET_SPEC, Some("[4, 2, 3, 0]")).unwrap();
        let second = comparator.compare(SET_SPEC, Some("[4, 2, 3, 0]")).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_input() {
        let comparator = JsonComparator::new();

        assert!(matches!(
            comparator.compare("{", Some("[]")),
            Err(ComparatorError::Specification(_))
        ));
        assert!(matches!(
            comparator.compare(REGEX_SPEC, Some("[1, 2")),
            Err(ComparatorError::ActualJson(_))
        ));
        assert!(matches!(
            comparator.compare(
                r#"{ "rules": [ { "selector": { "path": "$[?(@.a)]" }, "action": "set" } ], "templateJson": [] }"#,
                Some("[]")
            ),
            Err(ComparatorError::InvalidSelector { .. })
        ));
        assert!(matches!(
            comparator.compare(
                r#"{ "rules": [ { "selector": { "path": "$[0]" }, "action": "matches" } ], "templateJson": [1] }"#,
                Some("[1]")
            ),
            Err(ComparatorError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_unknown_rule() {
        let spec = r#"{
            "rules": [ { "selector": { "path": "$.a" }, "action": "x-action-x" } ],
            "templateJson": { "a": 1 }
        }"#;

        let err = JsonComparator::new().compare(spec, Some(r#"{ "a": 1 }"#)).unwrap_err();

        assert!(matches!(&err, ComparatorError::UnknownRule(action) if action == "x-action-x"));
    }

    #[derive(Debug)]
    struct Prefix;

    impl Rule for Prefix {
        fn compare(
            &self,
            path: &str,
            template: &Value,
            actual: &Value,
            _specification: &RuleSpecification,
            _children: &dyn ChildComparator,
        ) -> ComparisonOutcome {
            match (template.as_str(), actual.as_str()) {
                (Some(template), Some(actual)) if actual.starts_with(template) => {
                    ComparisonOutcome::matched(Depth::Deep)
                }
                _ => ComparisonOutcome::mismatch(
                    Depth::Deep,
                    format!("no common prefix at path {}", path),
                    path,
                ),
            }
        }
    }

    #[test]
    fn test_custom_rule() {
        let spec = r#"{
            "rules": [ { "selector": { "path": "$.names[*]" }, "action": "prefix" } ],
            "templateJson": { "names": ["Jo", "Ma"] }
        }"#;

        let comparator = JsonComparator::new().with_rule("prefix", Prefix);

        let outcome = comparator
            .compare(spec, Some(r#"{ "names": ["John", "Mary"] }"#))
            .unwrap();
        assert!(outcome.is_match());

        let outcome = comparator
            .compare(spec, Some(r#"{ "names": ["John", "Anna"] }"#))
            .unwrap();
        assert_eq!(outcome.message(), Some("no common prefix at path $['names'][1]"));

        // built-ins are gone once the registry is replaced
        let mut registry = RuleRegistry::new();
        registry.register("prefix", Prefix);
        let comparator = JsonComparator::new().with_registry(registry);
        assert!(comparator.registry().lookup("set").is_none());
        assert!(matches!(
            comparator.compare(SET_SPEC, Some("[1, 2, 3, 4]")),
            Err(ComparatorError::UnknownRule(_))
        ));
    }

    #[test]
    fn test_failure_details_with_rule() {
        let comparator = JsonComparator::new();
        let outcome = comparator.compare(REGEX_SPEC, Some("[2, 4, 6]")).unwrap();

        let details = comparator
            .extract_failure_details(REGEX_SPEC, Some("[2, 4, 6]"), &outcome)
            .unwrap()
            .unwrap();

        assert_eq!(details.template_element(), Some(&json!(3)));
        assert_eq!(details.actual_element(), Some(&json!(6)));
        let rule = details.matching_rule().unwrap();
        assert_eq!(rule.specification().selector.path, "$[2]");
        assert_eq!(rule.specification().pattern.as_deref(), Some("[3-5]"));
    }

    #[test]
    fn test_failure_details_without_rule() {
        let comparator = JsonComparator::new();
        let spec = r#"{ "templateJson": [2, 4, 6] }"#;
        let outcome = comparator.compare(spec, Some("[2, 4, 8]")).unwrap();

        let details = comparator
            .extract_failure_details(spec, Some("[2, 4, 8]"), &outcome)
            .unwrap()
            .unwrap();

        assert_eq!(details.template_element(), Some(&json!(6)));
        assert_eq!(details.actual_element(), Some(&json!(8)));
        assert!(details.matching_rule().is_none());
    }

    #[test]
    fn test_failure_details_at_container() {
        let comparator = JsonComparator::new();
        let spec = r#"{ "templateJson": { "f1": 1, "f2": 2 } }"#;
        let actual = r#"{ "f1": 1, "f3": 3 }"#;
        let outcome = comparator.compare(spec, Some(actual)).unwrap();

        let details = comparator
            .extract_failure_details(spec, Some(actual), &outcome)
            .unwrap()
            .unwrap();

        assert_eq!(details.template_element(), Some(&json!({ "f1": 1, "f2": 2 })));
        assert_eq!(details.actual_element(), Some(&json!({ "f1": 1, "f3": 3 })));
    }

    #[test]
    fn test_failure_details_missing_nodes() {
        let comparator = JsonComparator::new();
        let spec = r#"{ "templateJson": { "a": 1 } }"#;

        let outcome = comparator.compare(spec, None).unwrap();
        let details = comparator
            .extract_failure_details(spec, None, &outcome)
            .unwrap()
            .unwrap();
        assert_eq!(details.template_element(), Some(&json!({ "a": 1 })));
        assert_eq!(details.actual_element(), None);
        assert!(details.matching_rule().is_none());

        // set mismatch at an actual element the template does not have
        let outcome = comparator.compare(SET_SPEC, Some("[4, 2, 3, 0]")).unwrap();
        let details = comparator
            .extract_failure_details(r#"{ "templateJson": [] }"#, Some("[4, 2, 3, 0]"), &outcome)
            .unwrap()
            .unwrap();
        assert_eq!(details.template_element(), None);
        assert_eq!(details.actual_element(), Some(&json!(0)));
    }

    #[test]
    fn test_failure_details_of_match() {
        let comparator = JsonComparator::new();
        let outcome = comparator.compare(SET_SPEC, Some("[4, 3, 2, 1]")).unwrap();

        assert_eq!(
            comparator
                .extract_failure_details(SET_SPEC, Some("[4, 3, 2, 1]"), &outcome)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_fixtures() {
        let _ = env_logger::builder().is_test(true).try_init();

        let comparator = JsonComparator::new();
        let spec = fixture("orders-spec.json");

        let outcome = comparator
            .compare(&spec, Some(&fixture("orders-actual.json")))
            .unwrap();
        assert!(outcome.is_match(), "{}", outcome);

        let actual = fixture("orders-actual-mismatch.json");
        let outcome = comparator.compare(&spec, Some(&actual)).unwrap();
        assert!(!outcome.is_match());
        assert_eq!(outcome.error_path(), Some("$['orders'][1]"));
        assert_eq!(
            outcome.message(),
            Some("set comparison: failed to find match for path $['orders'][1]")
        );

        let details = comparator
            .extract_failure_details(&spec, Some(&actual), &outcome)
            .unwrap()
            .unwrap();
        assert_eq!(details.actual_element().unwrap()["sku"], json!("A-100"));
        assert_eq!(details.template_element().unwrap()["sku"], json!("B-200"));
        assert!(details.matching_rule().is_none());
    }

    #[test]
    fn test_shared_between_threads() {
        let comparator = Arc::new(JsonComparator::new());

        let handles = (0..8)
            .map(|i| {
                let comparator = Arc::clone(&comparator);
                thread::spawn(move || {
                    let actual = if i % 2 == 0 { "[4, 2, 3, 1]" } else { "[4, 2, 3, 0]" };
                    (i, comparator.compare(SET_SPEC, Some(actual)).unwrap())
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            let (i, outcome) = handle.join().unwrap();
            assert_eq!(outcome.is_match(), i % 2 == 0);
        }
    }
}
