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

mod rule_processor;

pub(crate) use rule_processor::RuleProcessor;

use log::trace;
use serde_json::{Map, Number, Value};

use crate::domain::{ComparisonOutcome, Depth, RuleSpecification};
use crate::error::ComparatorError;
use crate::json_path::{child_field, child_index, ROOT};
use crate::rules::{ChildComparator, RuleCompiler};

/// Walks a template and an actual document in lock-step, applying rules where their
/// selectors matched and exact structural comparison everywhere else.
///
/// One processor serves exactly one comparison.
#[derive(Debug)]
pub(crate) struct ComparisonProcessor<'a> {
    template: &'a Value,
    actual: &'a Value,
    rule_processor: RuleProcessor<'a>,
}

impl<'a> ComparisonProcessor<'a> {
    pub(crate) fn new(
        compiler: &'a RuleCompiler,
        template: &'a Value,
        rules: &'a [RuleSpecification],
        actual: &'a Value,
    ) -> Self {
        Self {
            template,
            actual,
            rule_processor: RuleProcessor::new(compiler, rules, actual),
        }
    }

    /// Resolves the rules and compares the documents from the root.
    pub(crate) fn execute_comparison(&mut self) -> Result<ComparisonOutcome, ComparatorError> {
        self.rule_processor.init()?;

        Ok(self.walk_and_compare(ROOT, self.template, self.actual))
    }

    fn walk_and_compare(&self, path: &str, template: &Value, actual: &Value) -> ComparisonOutcome {
        let outcome = match self.rule_processor.find_matching_rule(path) {
            Some(rule) => {
                trace!("applying rule {} at path {}", rule, path);
                rule.compare(path, template, actual, self)
            }
            None => shallow_compare(path, template, actual),
        };

        if !outcome.is_match() || outcome.is_deep() {
            return outcome;
        }

        match (template, actual) {
            (Value::Object(template), Value::Object(actual)) => {
                self.walk_object_fields(path, template, actual)
            }
            (Value::Array(template), Value::Array(actual)) => {
                self.walk_array(path, template, actual)
            }
            (_, Value::Object(_)) => ComparisonOutcome::mismatch(
                Depth::Deep,
                format!(
                    "template json at path {} is not an object, but the actual json is",
                    path
                ),
                path,
            ),
            (_, Value::Array(_)) => ComparisonOutcome::mismatch(
                Depth::Deep,
                format!(
                    "template json at path {} is not an array, but the actual json is",
                    path
                ),
                path,
            ),
            _ => outcome,
        }
    }

    fn walk_object_fields(
        &self,
        path: &str,
        template: &Map<String, Value>,
        actual: &Map<String, Value>,
    ) -> ComparisonOutcome {
        let same_fields =
            template.len() == actual.len() && actual.keys().all(|key| template.contains_key(key));

        if !same_fields {
            return ComparisonOutcome::mismatch(
                Depth::Deep,
                format!("object field sets do not match: path='{}'", path),
                path,
            );
        }

        let fields = actual
            .iter()
            .filter_map(|(key, actual)| template.get(key).map(|template| (key, template, actual)));

        for (key, template, actual) in fields {
            let outcome = self.walk_and_compare(&child_field(path, key), template, actual);
            if !outcome.is_match() {
                return ComparisonOutcome::propagate(Depth::Deep, outcome);
            }
        }

        ComparisonOutcome::matched(Depth::Deep)
    }

    fn walk_array(&self, path: &str, template: &[Value], actual: &[Value]) -> ComparisonOutcome {
        if template.len() != actual.len() {
            return ComparisonOutcome::mismatch(
                Depth::Deep,
                format!(
                    "array size mismatch: path='{}'; actualSize={}; expectedSize={}",
                    path,
                    actual.len(),
                    template.len()
                ),
                path,
            );
        }

        for (idx, (template, actual)) in template.iter().zip(actual).enumerate() {
            let outcome = self.walk_and_compare(&child_index(path, idx), template, actual);
            if !outcome.is_match() {
                return ComparisonOutcome::propagate(Depth::Deep, outcome);
            }
        }

        ComparisonOutcome::matched(Depth::Deep)
    }
}

impl ChildComparator for ComparisonProcessor<'_> {
    fn compare(&self, path: &str, template: &Value, actual: &Value) -> ComparisonOutcome {
        self.walk_and_compare(path, template, actual)
    }
}

/// Compares the node kinds, and primitive values exactly. Containers of the same kind are
/// a shallow match, their children are left to the walker.
fn shallow_compare(path: &str, template: &Value, actual: &Value) -> ComparisonOutcome {
    match (template, actual) {
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_)) => {
            ComparisonOutcome::matched(Depth::Shallow)
        }
        (Value::Object(_), _) => ComparisonOutcome::mismatch(
            Depth::Shallow,
            format!(
                "actual json at path {} is not an object, but an object is expected",
                path
            ),
            path,
        ),
        (Value::Array(_), _) => ComparisonOutcome::mismatch(
            Depth::Shallow,
            format!(
                "actual json at path {} is not an array, but an array is expected",
                path
            ),
            path,
        ),
        (Value::Number(template), Value::Number(actual)) if numbers_equal(template, actual) => {
            ComparisonOutcome::matched(Depth::Shallow)
        }
        (template, actual) if template == actual => ComparisonOutcome::matched(Depth::Shallow),
        (template, actual) => ComparisonOutcome::mismatch(
            Depth::Shallow,
            format!(
                "primitive mismatch at path {}: actual={}; expected={}",
                path, actual, template
            ),
            path,
        ),
    }
}

/// Numbers are equal by value whatever their textual form, `1`, `1.0` and `1e0` alike.
/// Integers compare exactly, anything else as `f64`.
fn numbers_equal(template: &Number, actual: &Number) -> bool {
    if let (Some(template), Some(actual)) = (template.as_i64(), actual.as_i64()) {
        return template == actual;
    }
    if let (Some(template), Some(actual)) = (template.as_u64(), actual.as_u64()) {
        return template == actual;
    }
    match (template.as_f64(), actual.as_f64()) {
        (Some(template), Some(actual)) => template == actual,
        _ => false,
    }
}
