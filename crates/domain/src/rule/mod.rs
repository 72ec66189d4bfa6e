//! Rule — a condition/action pair evaluated against every accepted event.
//!
//! Both halves are written in a small expression language. The condition is
//! a single boolean expression over `event`; the action is a sequence of
//! `controller.sendCommand(device, payload)` and
//! `controller.requestStatus(device)` calls separated by newlines or `;`.
//!
//! ```text
//! condition: float(event.payload) > 25
//! action:    controller.sendCommand('boiler', 'OFF')
//! ```
//!
//! Rule text is data, never host code: only the `event` fields, the builtin
//! functions and the two controller operations can be referenced.

mod ast;
mod error;
mod eval;
mod lexer;
mod parser;
mod value;

pub use ast::{BinaryOp, Builtin, Expr, Field, Program, Statement, UnaryOp};
pub use error::{EvalError, ParseError, ParseErrorKind};
pub use eval::Command;
pub use parser::{MAX_DEPTH, parse_expression, parse_program};
pub use value::{Value, ValueKind};

use serde::{Deserialize, Serialize};

use crate::error::{HubError, ValidationError};
use crate::id::RuleId;

/// A stored rule. The source text is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    pub condition: String,
    pub action: String,
}

impl Rule {
    /// Create a builder for constructing a [`Rule`].
    #[must_use]
    pub fn builder() -> RuleBuilder {
        RuleBuilder::default()
    }

    /// Parse both halves of the rule.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCondition`] or
    /// [`ValidationError::InvalidAction`] with the underlying parse error.
    pub fn compile(&self) -> Result<CompiledRule, ValidationError> {
        let condition =
            parse_expression(&self.condition).map_err(ValidationError::InvalidCondition)?;
        let action = parse_program(&self.action).map_err(ValidationError::InvalidAction)?;
        Ok(CompiledRule {
            id: self.id,
            name: self.name.clone(),
            condition,
            action,
        })
    }
}

/// Step-by-step builder for [`Rule`].
#[derive(Debug, Default)]
pub struct RuleBuilder {
    id: Option<RuleId>,
    name: Option<String>,
    condition: Option<String>,
    action: Option<String>,
}

impl RuleBuilder {
    #[must_use]
    pub fn id(mut self, id: RuleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Consume the builder and return a [`Rule`] whose text parses.
    ///
    /// Rules loaded back from storage are built without this check (see
    /// [`RuleBuilder::build_unchecked`]) so that a bad row cannot hide the
    /// rest of the table.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if the name is empty or either half
    /// fails to parse.
    pub fn build(self) -> Result<Rule, HubError> {
        let rule = self.build_unchecked();
        if rule.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        rule.compile()?;
        Ok(rule)
    }

    /// Assemble the rule without parsing its text.
    #[must_use]
    pub fn build_unchecked(self) -> Rule {
        Rule {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            condition: self.condition.unwrap_or_default(),
            action: self.action.unwrap_or_default(),
        }
    }
}

/// A rule with both halves parsed, ready to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub id: RuleId,
    pub name: String,
    pub condition: Expr,
    pub action: Program,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::id::DeviceId;

    fn boiler_rule() -> RuleBuilder {
        Rule::builder()
            .name("boiler off when hot")
            .condition("float(event.payload) > 25")
            .action("controller.sendCommand('boiler','OFF')")
    }

    #[test]
    fn should_build_rule_with_valid_text() {
        let rule = boiler_rule().build().unwrap();
        assert_eq!(rule.name, "boiler off when hot");
        assert_eq!(rule.condition, "float(event.payload) > 25");
    }

    #[test]
    fn should_generate_distinct_ids() {
        let a = boiler_rule().build().unwrap();
        let b = boiler_rule().build().unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn should_reject_empty_name() {
        let result = boiler_rule().name("  ").build();
        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_reject_unparseable_condition() {
        let result = boiler_rule().condition("float(event.payload) >").build();
        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::InvalidCondition(_)))
        ));
    }

    #[test]
    fn should_reject_unparseable_action() {
        let result = boiler_rule().action("import os").build();
        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::InvalidAction(_)))
        ));
    }

    #[test]
    fn should_reject_condition_nested_too_deeply() {
        let nested = format!("{}true", "not ".repeat(10_000));
        let result = boiler_rule().condition(nested).build();
        let Err(HubError::Validation(ValidationError::InvalidCondition(err))) = result else {
            panic!("expected an invalid condition");
        };
        assert_eq!(err.kind, ParseErrorKind::TooDeep { limit: MAX_DEPTH });
    }

    #[test]
    fn should_keep_invalid_text_when_built_unchecked() {
        let rule = boiler_rule().condition("((").build_unchecked();
        assert_eq!(rule.condition, "((");
        assert!(rule.compile().is_err());
    }

    #[test]
    fn should_fire_boiler_command_for_hot_reading() {
        let compiled = boiler_rule().build().unwrap().compile().unwrap();
        let event = Event::new(DeviceId::new("sensorTest").unwrap(), "30.0");

        assert!(compiled.condition.evaluate_condition(&event).unwrap());
        assert_eq!(
            compiled.action.commands(&event).unwrap(),
            vec![Command::Send {
                device_id: DeviceId::new("boiler").unwrap(),
                payload: "OFF".to_string(),
            }]
        );
    }
}
