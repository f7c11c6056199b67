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

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a [`ComparisonOutcome`] already covers the descendants of the node it was
/// produced for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Depth {
    /// Only the current node was evaluated; the walker still descends into containers.
    Shallow,
    /// The whole subtree was evaluated; the walker must not descend.
    Deep,
}

/// Result of comparing a node (and possibly its subtree) of the actual document against
/// the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonOutcome {
    depth: Depth,
    matched: bool,
    message: Option<String>,
    error_path: Option<String>,
}

impl ComparisonOutcome {
    /// A successful outcome.
    pub fn matched(depth: Depth) -> Self {
        Self {
            depth,
            matched: true,
            message: None,
            error_path: None,
        }
    }

    /// A failed outcome pinpointing the node at `error_path`.
    pub fn mismatch(depth: Depth, message: impl Into<String>, error_path: impl Into<String>) -> Self {
        Self {
            depth,
            matched: false,
            message: Some(message.into()),
            error_path: Some(error_path.into()),
        }
    }

    /// A failed outcome carrying the message and location of another outcome.
    pub(crate) fn propagate(depth: Depth, cause: ComparisonOutcome) -> Self {
        Self {
            depth,
            matched: cause.matched,
            message: cause.message,
            error_path: cause.error_path,
        }
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    pub fn is_deep(&self) -> bool {
        self.depth == Depth::Deep
    }

    pub fn is_match(&self) -> bool {
        self.matched
    }

    /// Description of the first difference found, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Normalized path of the node where the first difference was found.
    pub fn error_path(&self) -> Option<&str> {
        self.error_path.as_deref()
    }
}

impl Display for ComparisonOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.matched, &self.message) {
            (true, _) => write!(f, "match"),
            (false, Some(message)) => write!(f, "mismatch: {}", message),
            (false, None) => match &self.error_path {
                Some(path) => write!(f, "mismatch at {}", path),
                None => write!(f, "mismatch"),
            },
        }
    }
}

/// Path query identifying where a rule applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleSelector {
    pub path: String,
}

/// A user-authored rule: where it applies, what it does and its optional pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleSpecification {
    pub selector: RuleSelector,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl RuleSpecification {
    pub fn new(path: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            selector: RuleSelector { path: path.into() },
            action: action.into(),
            pattern: None,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

/// Top-level input of a comparison: the template document and the rules relaxing it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSpecification {
    #[serde(default)]
    pub rules: Option<Vec<RuleSpecification>>,
    #[serde(default)]
    pub template_json: Option<Value>,
}

impl ComparisonSpecification {
    pub fn rules(&self) -> &[RuleSpecification] {
        self.rules.as_deref().unwrap_or_default()
    }
}
