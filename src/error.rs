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

use thiserror::Error;

use crate::json_path::JsonPathError;

/// Errors that abort a comparison before any outcome can be produced.
///
/// Structural differences between the documents are never reported through this type,
/// they are encoded in a [`ComparisonOutcome`](crate::ComparisonOutcome).
#[derive(Debug, Error)]
pub enum ComparatorError {
    /// A rule specification names an action that is not registered.
    #[error("unknown rule action \"{0}\"")]
    UnknownRule(String),
    /// A rule selector is not a valid path query.
    #[error("invalid rule selector {selector:?}: {source}")]
    InvalidSelector {
        selector: String,
        #[source]
        source: JsonPathError,
    },
    /// A rule rejected its own specification, e.g. a missing or malformed pattern.
    #[error("invalid rule \"{action}\": {reason}")]
    InvalidRule { action: String, reason: String },
    /// The comparison specification document could not be deserialized.
    #[error("error parsing comparison specification: {0}")]
    Specification(#[source] serde_json::Error),
    /// The actual document is not valid JSON.
    #[error("error parsing actual json: {0}")]
    ActualJson(#[source] serde_json::Error),
    /// The actual document could not be retrieved.
    #[error("error fetching actual json from {url}: {reason}")]
    Fetch { url: String, reason: String },
}
