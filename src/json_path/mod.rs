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

//! Path queries over `serde_json` documents.
//!
//! Selectors are parsed into a [`Path`] and evaluated against a document, yielding the
//! normalized paths of every matched node (`$['store']['book'][0]`). The comparison walker
//! synthesizes its own paths with [`child_field`] and [`child_index`]; the evaluator builds
//! its results with the very same functions so rule lookups always agree on the format.

pub mod path;

pub use path::{JSONPath, Key, Path};
use serde_json::Value;
use thiserror::Error;

/// Normalized path of the document root.
pub const ROOT: &str = "$";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonPathError {
    #[error("path must start with '$'")]
    MissingRoot,
    #[error("unexpected end of path")]
    UnexpectedEnd,
    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },
    #[error("invalid index '{0}'")]
    InvalidIndex(String),
    #[error("filter expressions are not supported")]
    UnsupportedFilter,
}

/// Normalized path of the member `name` of the object at `parent`.
pub fn child_field(parent: &str, name: &str) -> String {
    let mut path = String::with_capacity(parent.len() + name.len() + 4);
    path.push_str(parent);
    path.push_str("['");
    for c in name.chars() {
        if c == '\'' || c == '\\' {
            path.push('\\');
        }
        path.push(c);
    }
    path.push_str("']");
    path
}

/// Normalized path of the element `index` of the array at `parent`.
pub fn child_index(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Evaluates `query` against `document` and returns the normalized paths it matches,
/// in document order. No match is an empty result, not an error.
pub fn select_paths(query: &str, document: &Value) -> Result<Vec<String>, JsonPathError> {
    let path = Path::from_jsonpath(query)?;
    Ok(path
        .query_located(document)
        .into_iter()
        .map(|(path, _)| path)
        .collect())
}

/// Resolves `query` to a single node, the first one matched.
pub fn select_one<'v>(query: &str, document: &'v Value) -> Result<Option<&'v Value>, JsonPathError> {
    let path = Path::from_jsonpath(query)?;
    Ok(path.resolve(document))
}
