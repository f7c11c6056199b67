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

//! Rules override the default structural comparison at the paths their selectors match.

mod array_as_set;
mod regex_match;
mod registry;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

pub use array_as_set::ArrayAsSet;
pub use regex_match::RegexMatch;
pub use registry::{RuleCompiler, RuleRegistry};

use crate::domain::{ComparisonOutcome, RuleSpecification};
use crate::error::ComparatorError;

/// Callback handed to rules so they can run full comparisons of child nodes.
///
/// The comparison walker implements it; child comparisons keep applying every rule whose
/// selector matched the child path.
pub trait ChildComparator {
    fn compare(&self, path: &str, template: &Value, actual: &Value) -> ComparisonOutcome;
}

impl<F> ChildComparator for F
where
    F: Fn(&str, &Value, &Value) -> ComparisonOutcome,
{
    fn compare(&self, path: &str, template: &Value, actual: &Value) -> ComparisonOutcome {
        self(path, template, actual)
    }
}

/// A named comparison override.
///
/// # Examples
///
/// ```
/// use json_comparator::rules::{ChildComparator, Rule};
/// use json_comparator::{ComparisonOutcome, Depth, RuleSpecification};
/// use serde_json::Value;
///
/// /// Accepts any value of the same JSON type as the template.
/// #[derive(Debug)]
/// struct SameType;
///
/// impl Rule for SameType {
///     fn compare(
///         &self,
///         path: &str,
///         template: &Value,
///         actual: &Value,
///         _specification: &RuleSpecification,
///         _children: &dyn ChildComparator,
///     ) -> ComparisonOutcome {
///         if std::mem::discriminant(template) == std::mem::discriminant(actual) {
///             ComparisonOutcome::matched(Depth::Deep)
///         } else {
///             ComparisonOutcome::mismatch(Depth::Deep, format!("type mismatch at path {}", path), path)
///         }
///     }
/// }
/// ```
pub trait Rule: fmt::Debug + Send + Sync {
    /// Compares `actual` against `template` at `path`.
    ///
    /// A [`Depth::Shallow`](crate::Depth::Shallow) outcome lets the walker descend into
    /// the children of `actual`; a [`Depth::Deep`](crate::Depth::Deep) one stops it.
    fn compare(
        &self,
        path: &str,
        template: &Value,
        actual: &Value,
        specification: &RuleSpecification,
        children: &dyn ChildComparator,
    ) -> ComparisonOutcome;

    /// Binds the rule to `specification` once, when the rule is compiled.
    ///
    /// Rules carrying per-specification state, such as a compiled pattern, return the bound
    /// instance. `None` keeps the registered instance, which is the default.
    fn bind(
        &self,
        _specification: &RuleSpecification,
    ) -> Result<Option<Arc<dyn Rule>>, ComparatorError> {
        Ok(None)
    }
}

/// A rule implementation bound to the specification parameterizing it.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: Arc<dyn Rule>,
    specification: RuleSpecification,
}

impl CompiledRule {
    pub fn new(rule: Arc<dyn Rule>, specification: RuleSpecification) -> Self {
        Self {
            rule,
            specification,
        }
    }

    pub fn rule(&self) -> &Arc<dyn Rule> {
        &self.rule
    }

    pub fn specification(&self) -> &RuleSpecification {
        &self.specification
    }

    pub fn compare(
        &self,
        path: &str,
        template: &Value,
        actual: &Value,
        children: &dyn ChildComparator,
    ) -> ComparisonOutcome {
        self.rule
            .compare(path, template, actual, &self.specification, children)
    }
}

impl PartialEq for CompiledRule {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rule, &other.rule) && self.specification == other.specification
    }
}

impl fmt::Display for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {}",
            self.specification.action, self.specification.selector.path
        )?;
        if let Some(pattern) = &self.specification.pattern {
            write!(f, " with pattern '{}'", pattern)?;
        }
        Ok(())
    }
}
