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

use super::{ArrayAsSet, CompiledRule, RegexMatch, Rule};
use crate::domain::RuleSpecification;
use crate::error::ComparatorError;

/// Action name of the built-in [`RegexMatch`] rule.
pub const MATCHES: &str = "matches";
/// Action name of the built-in [`ArrayAsSet`] rule.
pub const SET: &str = "set";

/// Rules by action name.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<String, Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// Constructs an empty registry.
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Constructs a registry holding the `matches` and `set` rules.
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::new();
        registry.register(MATCHES, RegexMatch::default());
        registry.register(SET, ArrayAsSet);
        registry
    }

    /// Registers `rule` under `action`, replacing any rule already registered there.
    pub fn register(&mut self, action: impl Into<String>, rule: impl Rule + 'static) {
        self.rules.insert(action.into(), Arc::new(rule));
    }

    pub fn lookup(&self, action: &str) -> Option<Arc<dyn Rule>> {
        self.rules.get(action).cloned()
    }
}

/// Binds rule specifications to the registered rule implementations.
#[derive(Debug, Clone)]
pub struct RuleCompiler {
    registry: RuleRegistry,
}

impl RuleCompiler {
    pub fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut RuleRegistry {
        &mut self.registry
    }

    pub fn compile(&self, specification: &RuleSpecification) -> Result<CompiledRule, ComparatorError> {
        let rule = self
            .registry
            .lookup(&specification.action)
            .ok_or_else(|| ComparatorError::UnknownRule(specification.action.clone()))?;

        let rule = rule.bind(specification)?.unwrap_or(rule);

        Ok(CompiledRule::new(rule, specification.clone()))
    }
}

impl Default for RuleCompiler {
    fn default() -> Self {
        Self::new(RuleRegistry::with_builtin_rules())
    }
}
