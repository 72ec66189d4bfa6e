//! Rule service — registry use-cases for rules.
//!
//! Every mutation ends with a reload so the engine's snapshot matches the
//! registry.

use std::sync::Arc;

use statehub_domain::error::{HubError, NotFoundError};
use statehub_domain::id::RuleId;
use statehub_domain::rule::Rule;

use crate::ports::RuleRepository;
use crate::rule_engine::RuleEngine;

/// Application service for rule CRUD, kept in sync with a [`RuleEngine`].
pub struct RuleService<R> {
    repo: R,
    engine: Arc<RuleEngine<R>>,
}

impl<R: RuleRepository> RuleService<R> {
    pub fn new(repo: R, engine: Arc<RuleEngine<R>>) -> Self {
        Self { repo, engine }
    }

    /// Validate, store and activate a rule.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if the name is empty or the condition
    /// or action does not parse, or a storage error from the repository.
    #[tracing::instrument(skip(self, condition, action))]
    pub async fn create_rule(
        &self,
        name: &str,
        condition: &str,
        action: &str,
    ) -> Result<Rule, HubError> {
        let rule = Rule::builder()
            .name(name)
            .condition(condition)
            .action(action)
            .build()?;
        let rule = self.repo.create(rule).await?;
        tracing::info!(rule_id = %rule.id, "rule created");
        self.engine.reload_rules().await?;
        Ok(rule)
    }

    /// List all rules in evaluation order.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_rules(&self) -> Result<Vec<Rule>, HubError> {
        self.repo.get_all().await
    }

    /// Look up a rule by id.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when no rule with `id` exists, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_rule(&self, id: RuleId) -> Result<Rule, HubError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Rule",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Remove a rule and deactivate it.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] if the rule does not exist, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_rule(&self, id: RuleId) -> Result<(), HubError> {
        self.repo.delete(id).await?;
        tracing::info!(rule_id = %id, "rule deleted");
        self.engine.reload_rules().await?;
        Ok(())
    }

    /// Rebuild the engine snapshot from the registry. Returns the number of
    /// active rules.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn reload(&self) -> Result<usize, HubError> {
        self.engine.reload_rules().await
    }
}
