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

use super::{ChildComparator, Rule};
use crate::domain::{ComparisonOutcome, Depth, RuleSpecification};
use crate::json_path::child_index;

/// Compares two arrays ignoring element order.
///
/// Every actual element must be matched, through a full child comparison, by a distinct
/// template element. Matching is greedy: each actual element consumes the first remaining
/// template element it matches, so an assignment that exists may still be missed when
/// child comparisons are looser than equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayAsSet;

impl Rule for ArrayAsSet {
    fn compare(
        &self,
        path: &str,
        template: &Value,
        actual: &Value,
        _specification: &RuleSpecification,
        children: &dyn ChildComparator,
    ) -> ComparisonOutcome {
        match (template, actual) {
            (Value::Array(template), Value::Array(actual)) => {
                compare_as_sets(path, template, actual, children)
            }
            (_, Value::Array(_)) => ComparisonOutcome::mismatch(
                Depth::Deep,
                format!("set rule on non-array template element at path {}", path),
                path,
            ),
            _ => ComparisonOutcome::mismatch(
                Depth::Deep,
                format!("set rule on non-array element at path {}", path),
                path,
            ),
        }
    }
}

fn compare_as_sets(
    path: &str,
    template: &[Value],
    actual: &[Value],
    children: &dyn ChildComparator,
) -> ComparisonOutcome {
    if template.len() != actual.len() {
        return ComparisonOutcome::mismatch(
            Depth::Deep,
            format!(
                "set comparison: sizes do not match at path {}: expectedCount={}; actualCount={}",
                path,
                template.len(),
                actual.len()
            ),
            path,
        );
    }

    let mut remaining: Vec<&Value> = template.iter().collect();

    for (idx, actual) in actual.iter().enumerate() {
        let child_path = child_index(path, idx);

        let found = remaining
            .iter()
            .position(|template| children.compare(&child_path, template, actual).is_match());

        match found {
            Some(position) => {
                remaining.remove(position);
            }
            None => {
                return ComparisonOutcome::mismatch(
                    Depth::Deep,
                    format!("set comparison: failed to find match for path {}", child_path),
                    child_path,
                )
            }
        }
    }

    ComparisonOutcome::matched(Depth::Deep)
}
