//! Procedure call descriptors.
//!
//! A [`ProcedureCall`] is the validated form of a `/procedure` request body.
//! Construction enforces the only structural invariant the gateway checks
//! before touching the backend: a function call must carry an OUT parameter
//! for its return value.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::naming::qualified_name;

/// Direction of a call argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Supplied by the caller.
    #[default]
    In,
    /// Produced by the backend and read back after execution.
    Out,
}

impl Direction {
    /// Parse a wire value. Only `out` (any case) selects [`Direction::Out`];
    /// anything else, including an empty string, is an IN argument.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("out") {
            Direction::Out
        } else {
            Direction::In
        }
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Direction::parse).unwrap_or_default())
    }
}

/// One argument of a procedure or function call, as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    /// Scalar value for IN arguments. Ignored for OUT arguments.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
    #[serde(default)]
    pub direction: Direction,
    /// Optional type hint: `number`, `string` or `date`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
}

impl ParameterDescriptor {
    /// IN argument with a value.
    pub fn input(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            direction: Direction::In,
            type_hint: None,
        }
    }

    /// OUT argument without a type hint.
    pub fn output(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Value::Null,
            direction: Direction::Out,
            type_hint: None,
        }
    }

    /// Attach a type hint.
    pub fn with_type(mut self, type_hint: impl Into<String>) -> Self {
        self.type_hint = Some(type_hint.into());
        self
    }

    pub fn is_out(&self) -> bool {
        self.direction == Direction::Out
    }
}

/// Whether the routine is a procedure or a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineKind {
    Procedure,
    Function,
}

impl fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutineKind::Procedure => f.write_str("Procedure"),
            RoutineKind::Function => f.write_str("Function"),
        }
    }
}

/// A validated procedure or function invocation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureCall {
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<String>,
    name: String,
    is_function: bool,
    params: Vec<ParameterDescriptor>,
}

impl ProcedureCall {
    /// Validate and build a call descriptor.
    ///
    /// Fails with [`CoreError::Validation`] when `name` is blank or when a
    /// function call has no OUT parameter to receive its return value.
    pub fn new(
        schema: Option<String>,
        name: impl Into<String>,
        is_function: bool,
        params: Vec<ParameterDescriptor>,
    ) -> Result<Self, CoreError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::Validation("Missing field 'name'".into()));
        }

        if is_function && !params.iter().any(ParameterDescriptor::is_out) {
            return Err(CoreError::Validation(
                "A function call must include an OUT parameter for the return value".into(),
            ));
        }

        Ok(Self {
            schema: schema.filter(|s| !s.is_empty()),
            name,
            is_function,
            params,
        })
    }

    pub fn schema(&self) -> &str {
        self.schema.as_deref().unwrap_or("")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_function(&self) -> bool {
        self.is_function
    }

    pub fn params(&self) -> &[ParameterDescriptor] {
        &self.params
    }

    pub fn kind(&self) -> RoutineKind {
        if self.is_function {
            RoutineKind::Function
        } else {
            RoutineKind::Procedure
        }
    }

    /// The reference spliced into the call text.
    pub fn qualified_name(&self) -> String {
        qualified_name(self.schema(), &self.name)
    }

    /// Index of the parameter bound to a function's return value: the first
    /// OUT parameter. Always `None` for procedures.
    pub fn return_slot(&self) -> Option<usize> {
        if !self.is_function {
            return None;
        }
        self.params.iter().position(ParameterDescriptor::is_out)
    }

    /// JSON snapshot stored on async jobs for audit and replay.
    pub fn snapshot(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!(Direction::parse("OUT"), Direction::Out);
        assert_eq!(Direction::parse("out"), Direction::Out);
        assert_eq!(Direction::parse(" Out "), Direction::Out);
        assert_eq!(Direction::parse("IN"), Direction::In);
        assert_eq!(Direction::parse(""), Direction::In);
        assert_eq!(Direction::parse("INOUT"), Direction::In);
    }

    #[test]
    fn descriptor_defaults_to_in_with_null_value() {
        let p: ParameterDescriptor = serde_json::from_value(json!({"name": "p_id"})).unwrap();
        assert_eq!(p.direction, Direction::In);
        assert!(p.value.is_null());
        assert_eq!(p.type_hint, None);
    }

    #[test]
    fn descriptor_reads_type_hint_and_null_direction() {
        let p: ParameterDescriptor =
            serde_json::from_value(json!({"name": "x", "direction": null, "type": "number"}))
                .unwrap();
        assert_eq!(p.direction, Direction::In);
        assert_eq!(p.type_hint.as_deref(), Some("number"));
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = ProcedureCall::new(None, "  ", false, vec![]).unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn function_without_out_parameter_is_rejected() {
        let err = ProcedureCall::new(
            None,
            "calc_total",
            true,
            vec![ParameterDescriptor::input("p_a", json!(1))],
        )
        .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("OUT"));
    }

    #[test]
    fn procedure_without_out_parameter_is_accepted() {
        let call = ProcedureCall::new(None, "do_work", false, vec![]).unwrap();
        assert_eq!(call.kind(), RoutineKind::Procedure);
        assert_eq!(call.return_slot(), None);
    }

    #[test]
    fn return_slot_is_first_out_parameter() {
        let call = ProcedureCall::new(
            None,
            "f",
            true,
            vec![
                ParameterDescriptor::input("a", json!(1)),
                ParameterDescriptor::output("ret"),
                ParameterDescriptor::output("extra"),
            ],
        )
        .unwrap();
        assert_eq!(call.return_slot(), Some(1));
    }

    #[test]
    fn empty_schema_is_dropped() {
        let call = ProcedureCall::new(Some(String::new()), "p", false, vec![]).unwrap();
        assert_eq!(call.schema(), "");
        assert_eq!(call.qualified_name(), "P");
    }

    #[test]
    fn snapshot_uses_wire_field_names() {
        let call = ProcedureCall::new(
            Some("hr".into()),
            "calc",
            true,
            vec![ParameterDescriptor::output("total").with_type("number")],
        )
        .unwrap();
        let snap = call.snapshot();
        assert_eq!(snap["schema"], "hr");
        assert_eq!(snap["name"], "calc");
        assert_eq!(snap["isFunction"], true);
        assert_eq!(snap["params"][0]["direction"], "OUT");
        assert_eq!(snap["params"][0]["type"], "number");
        assert!(snap["params"][0].get("value").is_none());
    }
}
