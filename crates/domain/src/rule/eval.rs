//! Interpreter for parsed rules.
//!
//! Evaluation is pure: it reads the `event` binding and produces values or
//! [`Command`]s. Dispatching commands to devices is the caller's job.

use super::ast::{BinaryOp, Builtin, Expr, Field, Program, Statement, UnaryOp};
use super::error::EvalError;
use super::value::Value;
use crate::event::Event;
use crate::id::DeviceId;

/// A controller call produced by running an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send { device_id: DeviceId, payload: String },
    RequestStatus { device_id: DeviceId },
}

impl Expr {
    /// Evaluate this expression with `event` bound.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] on type mismatches, failed conversions or
    /// division by zero.
    pub fn evaluate(&self, event: &Event) -> Result<Value, EvalError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Field(field) => Ok(Value::Text(match field {
                Field::DeviceId => event.device_id.to_string(),
                Field::Payload => event.payload.clone(),
                Field::CreatedAt => event.created_at.to_rfc3339(),
            })),
            Self::Unary { op, operand } => unary(*op, operand.evaluate(event)?),
            Self::Binary { op, lhs, rhs } => match op {
                BinaryOp::And => Ok(Value::Bool(
                    as_bool(lhs.evaluate(event)?)? && as_bool(rhs.evaluate(event)?)?,
                )),
                BinaryOp::Or => Ok(Value::Bool(
                    as_bool(lhs.evaluate(event)?)? || as_bool(rhs.evaluate(event)?)?,
                )),
                _ => binary(*op, lhs.evaluate(event)?, rhs.evaluate(event)?),
            },
            Self::Call { function, args } => {
                let args = args
                    .iter()
                    .map(|arg| arg.evaluate(event))
                    .collect::<Result<Vec<_>, _>>()?;
                call(*function, args)
            }
        }
    }

    /// Evaluate as a rule condition. Anything but a boolean is an error.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::NotBoolean`] for non-boolean results, or any
    /// error raised while evaluating.
    pub fn evaluate_condition(&self, event: &Event) -> Result<bool, EvalError> {
        as_bool(self.evaluate(event)?)
    }
}

impl Program {
    /// Resolve every statement into a [`Command`], in order.
    ///
    /// Nothing is dispatched here, so a failing statement leaves no
    /// partially-applied action behind.
    ///
    /// # Errors
    ///
    /// Returns the first [`EvalError`] raised by any argument.
    pub fn commands(&self, event: &Event) -> Result<Vec<Command>, EvalError> {
        self.statements
            .iter()
            .map(|statement| match statement {
                Statement::SendCommand { device, payload } => Ok(Command::Send {
                    device_id: device_argument(device, event)?,
                    payload: text_argument(payload, event)?,
                }),
                Statement::RequestStatus { device } => Ok(Command::RequestStatus {
                    device_id: device_argument(device, event)?,
                }),
            })
            .collect()
    }
}

fn text_argument(expr: &Expr, event: &Event) -> Result<String, EvalError> {
    match expr.evaluate(event)? {
        value @ (Value::Text(_) | Value::Number(_)) => Ok(value.to_string()),
        other => Err(EvalError::NotText(other.kind())),
    }
}

fn device_argument(expr: &Expr, event: &Event) -> Result<DeviceId, EvalError> {
    DeviceId::new(text_argument(expr, event)?).map_err(EvalError::InvalidDevice)
}

fn as_bool(value: Value) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(EvalError::NotBoolean(other.kind())),
    }
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
        (op, other) => Err(EvalError::UnsupportedOperand {
            op,
            kind: other.kind(),
        }),
    }
}

#[allow(clippy::float_cmp)]
fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    use Value::{Bool, Number, Text};

    let mismatch = |lhs: &Value, rhs: &Value| EvalError::UnsupportedOperands {
        op,
        lhs: lhs.kind(),
        rhs: rhs.kind(),
    };

    match (op, &lhs, &rhs) {
        (BinaryOp::Eq, _, _) => Ok(Bool(lhs == rhs)),
        (BinaryOp::Ne, _, _) => Ok(Bool(lhs != rhs)),

        (BinaryOp::Add, Number(a), Number(b)) => Ok(Number(a + b)),
        (BinaryOp::Add, Text(a), Text(b)) => Ok(Text(format!("{a}{b}"))),
        (BinaryOp::Sub, Number(a), Number(b)) => Ok(Number(a - b)),
        (BinaryOp::Mul, Number(a), Number(b)) => Ok(Number(a * b)),
        (BinaryOp::Div | BinaryOp::Rem, Number(_), Number(b)) if *b == 0.0 => {
            Err(EvalError::DivisionByZero)
        }
        (BinaryOp::Div, Number(a), Number(b)) => Ok(Number(a / b)),
        (BinaryOp::Rem, Number(a), Number(b)) => Ok(Number(a % b)),

        (BinaryOp::Lt, Number(a), Number(b)) => Ok(Bool(a < b)),
        (BinaryOp::Le, Number(a), Number(b)) => Ok(Bool(a <= b)),
        (BinaryOp::Gt, Number(a), Number(b)) => Ok(Bool(a > b)),
        (BinaryOp::Ge, Number(a), Number(b)) => Ok(Bool(a >= b)),
        (BinaryOp::Lt, Text(a), Text(b)) => Ok(Bool(a < b)),
        (BinaryOp::Le, Text(a), Text(b)) => Ok(Bool(a <= b)),
        (BinaryOp::Gt, Text(a), Text(b)) => Ok(Bool(a > b)),
        (BinaryOp::Ge, Text(a), Text(b)) => Ok(Bool(a >= b)),

        (BinaryOp::In, Text(needle), Text(haystack)) => {
            Ok(Bool(haystack.contains(needle.as_str())))
        }

        _ => Err(mismatch(&lhs, &rhs)),
    }
}

fn call(function: Builtin, mut args: Vec<Value>) -> Result<Value, EvalError> {
    let unsupported = |value: &Value| EvalError::UnsupportedArgument {
        function,
        kind: value.kind(),
    };

    // arity is checked by the parser
    let first = args.remove(0);
    match function {
        Builtin::Float => to_number(first).map(Value::Number),
        Builtin::Int => to_number(first).map(|n| Value::Number(n.trunc())),
        Builtin::Str => Ok(Value::Text(first.to_string())),
        Builtin::Abs => match first {
            Value::Number(n) => Ok(Value::Number(n.abs())),
            other => Err(unsupported(&other)),
        },
        Builtin::Len => match first {
            #[allow(clippy::cast_precision_loss)]
            Value::Text(s) => Ok(Value::Number(s.chars().count() as f64)),
            other => Err(unsupported(&other)),
        },
        Builtin::Lower => match first {
            Value::Text(s) => Ok(Value::Text(s.to_lowercase())),
            other => Err(unsupported(&other)),
        },
        Builtin::Upper => match first {
            Value::Text(s) => Ok(Value::Text(s.to_uppercase())),
            other => Err(unsupported(&other)),
        },
        Builtin::StartsWith | Builtin::EndsWith => {
            let second = args.remove(0);
            match (&first, &second) {
                (Value::Text(s), Value::Text(affix)) => Ok(Value::Bool(
                    if function == Builtin::StartsWith {
                        s.starts_with(affix.as_str())
                    } else {
                        s.ends_with(affix.as_str())
                    },
                )),
                (Value::Text(_), other) | (other, _) => Err(unsupported(other)),
            }
        }
    }
}

fn to_number(value: Value) -> Result<f64, EvalError> {
    match value {
        Value::Number(n) => Ok(n),
        Value::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or(EvalError::NotANumber(s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{parse_expression, parse_program};
    use crate::rule::value::ValueKind;

    fn event(device: &str, payload: &str) -> Event {
        Event::new(DeviceId::new(device).unwrap(), payload)
    }

    fn eval(source: &str, payload: &str) -> Result<Value, EvalError> {
        parse_expression(source)
            .unwrap()
            .evaluate(&event("sensorTest", payload))
    }

    #[test]
    fn should_fire_threshold_when_payload_above() {
        let expr = parse_expression("float(event.payload) > 25").unwrap();
        assert!(expr.evaluate_condition(&event("t", "30.0")).unwrap());
        assert!(!expr.evaluate_condition(&event("t", "22.5")).unwrap());
    }

    #[test]
    fn should_fail_float_conversion_of_non_numeric_payload() {
        assert_eq!(
            eval("float(event.payload) > 25", "ON"),
            Err(EvalError::NotANumber("ON".to_string()))
        );
    }

    #[test]
    fn should_treat_non_boolean_condition_as_error() {
        let expr = parse_expression("event.payload").unwrap();
        assert_eq!(
            expr.evaluate_condition(&event("t", "ON")),
            Err(EvalError::NotBoolean(ValueKind::Text))
        );
    }

    #[test]
    fn should_compare_across_types_as_unequal() {
        assert_eq!(eval("event.payload == 1", "1"), Ok(Value::Bool(false)));
        assert_eq!(eval("event.payload != 1", "1"), Ok(Value::Bool(true)));
    }

    #[test]
    fn should_refuse_ordering_across_types() {
        assert!(matches!(
            eval("event.payload > 1", "2"),
            Err(EvalError::UnsupportedOperands { op: BinaryOp::Gt, .. })
        ));
    }

    #[test]
    fn should_compare_text_lexicographically() {
        assert_eq!(eval("event.payload >= '09:30'", "10:00:00"), Ok(Value::Bool(true)));
    }

    #[test]
    fn should_short_circuit_and() {
        // the right side would fail to convert
        assert_eq!(
            eval("false and float(event.payload) > 1", "ON"),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn should_short_circuit_or() {
        assert_eq!(
            eval("true or float(event.payload) > 1", "ON"),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn should_require_boolean_operands_for_logic() {
        assert_eq!(
            eval("1 and true", ""),
            Err(EvalError::NotBoolean(ValueKind::Number))
        );
    }

    #[test]
    fn should_evaluate_arithmetic() {
        assert_eq!(eval("(1 + 2) * 3 - 4 / 2", ""), Ok(Value::Number(7.0)));
        assert_eq!(eval("7 % 4", ""), Ok(Value::Number(3.0)));
        assert_eq!(eval("-float(event.payload)", "2.5"), Ok(Value::Number(-2.5)));
    }

    #[test]
    fn should_report_division_by_zero() {
        assert_eq!(eval("1 / 0", ""), Err(EvalError::DivisionByZero));
        assert_eq!(eval("1 % 0", ""), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn should_concatenate_text() {
        assert_eq!(
            eval("event.device_id + ':' + event.payload", "ON"),
            Ok(Value::Text("sensorTest:ON".to_string()))
        );
    }

    #[test]
    fn should_test_substring_with_in() {
        assert_eq!(eval("'ON' in upper(event.payload)", "on"), Ok(Value::Bool(true)));
        assert_eq!(eval("'x' in event.payload", "on"), Ok(Value::Bool(false)));
    }

    #[test]
    fn should_apply_text_builtins() {
        assert_eq!(eval("lower(event.payload)", "OFF"), Ok(Value::Text("off".into())));
        assert_eq!(eval("len(event.payload)", "22.5"), Ok(Value::Number(4.0)));
        assert_eq!(eval("startswith(event.payload, '22')", "22.5"), Ok(Value::Bool(true)));
        assert_eq!(eval("endswith(event.payload, '.0')", "22.5"), Ok(Value::Bool(false)));
    }

    #[test]
    fn should_truncate_with_int() {
        assert_eq!(eval("int(event.payload)", "22.9"), Ok(Value::Number(22.0)));
    }

    #[test]
    fn should_reject_text_builtin_on_number() {
        assert!(matches!(
            eval("upper(3)", ""),
            Err(EvalError::UnsupportedArgument {
                function: Builtin::Upper,
                kind: ValueKind::Number
            })
        ));
    }

    #[test]
    fn should_expose_created_at_as_rfc3339_text() {
        let ev = event("t", "x");
        let value = parse_expression("event.created_at")
            .unwrap()
            .evaluate(&ev)
            .unwrap();
        assert_eq!(value, Value::Text(ev.created_at.to_rfc3339()));
    }

    #[test]
    fn should_resolve_program_into_commands() {
        let program = parse_program(
            "controller.sendCommand('boiler', 'OFF')\ncontroller.requestStatus(event.device_id)",
        )
        .unwrap();
        let commands = program.commands(&event("sensorTest", "30.0")).unwrap();
        assert_eq!(
            commands,
            vec![
                Command::Send {
                    device_id: DeviceId::new("boiler").unwrap(),
                    payload: "OFF".to_string(),
                },
                Command::RequestStatus {
                    device_id: DeviceId::new("sensorTest").unwrap(),
                },
            ]
        );
    }

    #[test]
    fn should_render_numeric_payload_argument() {
        let program = parse_program("controller.sendCommand('dimmer', 10 * 5)").unwrap();
        let commands = program.commands(&event("t", "")).unwrap();
        assert_eq!(
            commands,
            vec![Command::Send {
                device_id: DeviceId::new("dimmer").unwrap(),
                payload: "50".to_string(),
            }]
        );
    }

    #[test]
    fn should_reject_boolean_command_argument() {
        let program = parse_program("controller.sendCommand('boiler', true)").unwrap();
        assert_eq!(
            program.commands(&event("t", "")),
            Err(EvalError::NotText(ValueKind::Bool))
        );
    }

    #[test]
    fn should_reject_invalid_target_device() {
        let program = parse_program("controller.sendCommand('a/b', 'ON')").unwrap();
        assert!(matches!(
            program.commands(&event("t", "")),
            Err(EvalError::InvalidDevice(_))
        ));
    }

    #[test]
    fn should_produce_no_commands_when_a_later_statement_fails() {
        let program = parse_program(
            "controller.sendCommand('boiler', 'OFF'); controller.sendCommand('x', 1 / 0)",
        )
        .unwrap();
        assert_eq!(
            program.commands(&event("t", "")),
            Err(EvalError::DivisionByZero)
        );
    }
}
