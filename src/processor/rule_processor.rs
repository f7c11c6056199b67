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

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};
use serde_json::Value;

use crate::domain::RuleSpecification;
use crate::error::ComparatorError;
use crate::json_path::Path;
use crate::rules::{CompiledRule, RuleCompiler};

/// Resolves rule selectors against one actual document and answers which rule, if any,
/// applies at a concrete path.
///
/// The resolved map is only valid for the document it was built from, so a processor is
/// created per comparison.
#[derive(Debug)]
pub(crate) struct RuleProcessor<'a> {
    compiler: &'a RuleCompiler,
    rules: &'a [RuleSpecification],
    actual: &'a Value,
    rule_path_map: HashMap<String, Arc<CompiledRule>>,
}

impl<'a> RuleProcessor<'a> {
    pub(crate) fn new(
        compiler: &'a RuleCompiler,
        rules: &'a [RuleSpecification],
        actual: &'a Value,
    ) -> Self {
        Self {
            compiler,
            rules,
            actual,
            rule_path_map: HashMap::new(),
        }
    }

    /// Evaluates every selector and records the compiled rule for each matched path.
    ///
    /// Later specifications overwrite earlier ones at the same path.
    pub(crate) fn init(&mut self) -> Result<(), ComparatorError> {
        debug!("compiling rules");

        for specification in self.rules {
            let selector = specification.selector.path.as_str();

            debug!("compiling rule for path selector {}", selector);

            let path =
                Path::from_jsonpath(selector).map_err(|source| ComparatorError::InvalidSelector {
                    selector: selector.to_string(),
                    source,
                })?;

            let matched = path.query_located(self.actual);
            if matched.is_empty() {
                trace!("rule for path selector {} did not match any paths", selector);
                continue;
            }

            let compiled = Arc::new(self.compiler.compile(specification)?);
            for (path, _) in matched {
                trace!("rule for path selector {} matched {}", selector, path);
                self.rule_path_map.insert(path, Arc::clone(&compiled));
            }
        }

        debug!("done compiling rules");
        Ok(())
    }

    pub(crate) fn find_matching_rule(&self, path: &str) -> Option<&CompiledRule> {
        self.rule_path_map.get(path).map(Arc::as_ref)
    }
}
