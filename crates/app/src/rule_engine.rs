//! Rule engine — evaluates the rule snapshot against every accepted event.
//!
//! The engine keeps compiled rules in an immutable snapshot. A reload builds
//! a complete new snapshot off to the side and swaps it in with a single
//! store, so an evaluation pass always works on one snapshot from start to
//! finish, whatever reloads happen meanwhile.
//!
//! Rules are isolated from each other: a condition or action that fails is
//! logged and the pass continues with the next rule.

use std::sync::Arc;

use tokio::sync::watch;

use statehub_domain::error::HubError;
use statehub_domain::event::Event;
use statehub_domain::id::RuleId;
use statehub_domain::rule::CompiledRule;

use crate::ports::{DeviceController, EventListener, RuleRepository};

/// The rules one evaluation pass works on, in list order.
pub type RuleSnapshot = Arc<[CompiledRule]>;

/// Outcome of evaluating one event against a snapshot.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Rules whose condition held and whose action was resolved.
    pub fired: Vec<RuleId>,
    /// Rules whose condition or action raised.
    pub failed: Vec<RuleId>,
    /// Commands that could not be handed to the controller.
    pub undelivered: usize,
}

/// Evaluates rules and dispatches their commands through a [`DeviceController`].
pub struct RuleEngine<R> {
    repo: R,
    controller: Arc<dyn DeviceController>,
    snapshot: watch::Sender<RuleSnapshot>,
}

impl<R: RuleRepository> RuleEngine<R> {
    /// Create an engine with an empty snapshot; call
    /// [`reload_rules`](Self::reload_rules) before routing events.
    pub fn new(repo: R, controller: Arc<dyn DeviceController>) -> Self {
        let (snapshot, _) = watch::channel(RuleSnapshot::from(Vec::new()));
        Self {
            repo,
            controller,
            snapshot,
        }
    }

    /// Re-read every rule from the registry and publish a new snapshot.
    ///
    /// Rules whose text no longer parses are left out and logged. Returns
    /// the number of rules in the new snapshot.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the rules cannot be listed; the previous
    /// snapshot stays in place.
    #[tracing::instrument(skip(self))]
    pub async fn reload_rules(&self) -> Result<usize, HubError> {
        let rules = self.repo.get_all().await?;
        let total = rules.len();
        let compiled: Vec<CompiledRule> = rules
            .into_iter()
            .filter_map(|rule| match rule.compile() {
                Ok(compiled) => Some(compiled),
                Err(err) => {
                    tracing::error!(
                        rule = %rule.name,
                        rule_id = %rule.id,
                        error = %err,
                        "skipping rule that does not compile"
                    );
                    None
                }
            })
            .collect();
        let count = compiled.len();
        self.snapshot.send_replace(RuleSnapshot::from(compiled));
        tracing::info!(count, skipped = total - count, "rules reloaded");
        Ok(count)
    }

    /// The snapshot currently used for new evaluation passes.
    #[must_use]
    pub fn snapshot(&self) -> RuleSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Notified after each reload.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RuleSnapshot> {
        self.snapshot.subscribe()
    }

    /// Run every rule of the current snapshot against `event`.
    pub fn evaluate(&self, event: &Event) -> PassReport {
        let rules = self.snapshot();
        let mut report = PassReport::default();

        for rule in rules.iter() {
            match rule.condition.evaluate_condition(event) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    tracing::error!(
                        rule = %rule.name,
                        event_id = %event.id,
                        error = %err,
                        "rule condition failed"
                    );
                    report.failed.push(rule.id);
                    continue;
                }
            }

            let commands = match rule.action.commands(event) {
                Ok(commands) => commands,
                Err(err) => {
                    tracing::error!(
                        rule = %rule.name,
                        event_id = %event.id,
                        error = %err,
                        "rule action failed"
                    );
                    report.failed.push(rule.id);
                    continue;
                }
            };

            tracing::info!(
                rule = %rule.name,
                device_id = %event.device_id,
                commands = commands.len(),
                "rule fired"
            );
            report.fired.push(rule.id);
            for command in &commands {
                if let Err(err) = self.controller.dispatch(command) {
                    tracing::error!(
                        rule = %rule.name,
                        ?command,
                        error = %err,
                        "command dispatch failed"
                    );
                    report.undelivered += 1;
                }
            }
        }

        report
    }
}

impl<R: RuleRepository> EventListener for RuleEngine<R> {
    fn on_event(&self, event: &Event) -> Result<(), HubError> {
        self.evaluate(event);
        Ok(())
    }
}
