//! Parameter binder.
//!
//! Classifies every [`ParameterDescriptor`] into a bind slot: a literal IN
//! value, or an OUT destination whose kind is declared or inferred from the
//! parameter name. The binder never rejects a value; type mismatches only
//! surface when the backend executes the call.

use chrono::NaiveDate;
use serde_json::Value;

use crate::procedure::ParameterDescriptor;

/// Capacity reserved for textual OUT destinations, in characters.
pub const OUT_TEXT_CAPACITY: usize = 4000;

/// Name fragments that mark an untyped OUT parameter as numeric.
pub const NUMERIC_NAME_KEYWORDS: [&str; 8] = [
    "resultado", "result", "total", "count", "suma", "num", "int", "id",
];

/// Type hints that force a numeric OUT destination.
const NUMERIC_TYPE_HINTS: [&str; 3] = ["number", "integer", "float"];

/// Name fragments that make a string IN value a date candidate.
const DATE_NAME_KEYWORDS: [&str; 2] = ["fecha", "periodo"];

/// Kind of backend-side destination allocated for an OUT parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutKind {
    /// Nullable 64-bit float.
    Numeric,
    /// Fixed-capacity character buffer.
    Textual,
}

/// Decide the destination kind for an OUT parameter.
///
/// An explicit numeric type hint wins; otherwise the lower-cased name is
/// matched against [`NUMERIC_NAME_KEYWORDS`] by substring.
pub fn classify_out_kind(name: &str, type_hint: Option<&str>) -> OutKind {
    if let Some(hint) = type_hint {
        let hint = hint.trim().to_lowercase();
        if NUMERIC_TYPE_HINTS.contains(&hint.as_str()) {
            return OutKind::Numeric;
        }
    }

    let lower = name.to_lowercase();
    if NUMERIC_NAME_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        OutKind::Numeric
    } else {
        OutKind::Textual
    }
}

/// An OUT destination owned by a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutBinding {
    /// 0-based position in the argument list.
    pub slot_index: usize,
    /// Echoed back as the key in the result map.
    pub name: String,
    pub kind: OutKind,
}

impl OutBinding {
    /// Initial contents of a textual destination: blanks reserving
    /// [`OUT_TEXT_CAPACITY`] characters on the backend side.
    pub fn blank_text_buffer() -> String {
        " ".repeat(OUT_TEXT_CAPACITY)
    }
}

/// A literal IN argument, converted from its JSON scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl BindValue {
    /// Raw passthrough of a JSON value. Arrays and objects are bound as
    /// their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => BindValue::Integer(i),
                None => BindValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => BindValue::Text(s.clone()),
            other => BindValue::Text(other.to_string()),
        }
    }
}

/// One positional argument of the call.
#[derive(Debug, Clone, PartialEq)]
pub enum BindSlot {
    In(BindValue),
    Out(OutBinding),
}

impl BindSlot {
    pub fn as_out(&self) -> Option<&OutBinding> {
        match self {
            BindSlot::Out(out) => Some(out),
            BindSlot::In(_) => None,
        }
    }
}

/// Parse a date written as `YYYY-MM-DD` or, failing that, `DD/MM/YYYY`.
///
/// Both layouts require two-digit day and month fields.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    if bytes.len() != 10 {
        return None;
    }

    if bytes[4] == b'-' && bytes[7] == b'-' {
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date);
        }
    }

    if bytes[2] == b'/' && bytes[5] == b'/' {
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%d/%m/%Y") {
            return Some(date);
        }
    }

    None
}

fn is_date_candidate(param: &ParameterDescriptor) -> bool {
    let lower = param.name.to_lowercase();
    DATE_NAME_KEYWORDS.iter().any(|kw| lower.contains(kw))
        || param
            .type_hint
            .as_deref()
            .is_some_and(|hint| hint.trim().eq_ignore_ascii_case("date"))
}

/// Convert an IN descriptor into its bind value.
///
/// Date candidates holding an unparseable string fall back to the raw text.
pub fn bind_input(param: &ParameterDescriptor) -> BindValue {
    if is_date_candidate(param) {
        if let Value::String(s) = &param.value {
            if let Some(date) = parse_date(s) {
                return BindValue::Date(date);
            }
        }
    }
    BindValue::from_json(&param.value)
}

/// Classify a descriptor into the slot at `slot_index`.
pub fn bind_parameter(param: &ParameterDescriptor, slot_index: usize) -> BindSlot {
    if param.is_out() {
        BindSlot::Out(OutBinding {
            slot_index,
            name: param.name.clone(),
            kind: classify_out_kind(&param.name, param.type_hint.as_deref()),
        })
    } else {
        BindSlot::In(bind_input(param))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    // -- classify_out_kind ----------------------------------------------------

    #[test]
    fn keyword_names_are_numeric() {
        assert_eq!(classify_out_kind("total_resultado", None), OutKind::Numeric);
        assert_eq!(classify_out_kind("P_COUNT", None), OutKind::Numeric);
        assert_eq!(classify_out_kind("v_suma", None), OutKind::Numeric);
        assert_eq!(classify_out_kind("cliente_id", None), OutKind::Numeric);
    }

    #[test]
    fn other_names_are_textual() {
        assert_eq!(classify_out_kind("mensaje", None), OutKind::Textual);
        assert_eq!(classify_out_kind("p_nombre", None), OutKind::Textual);
    }

    #[test]
    fn substring_match_catches_embedded_keywords() {
        // "descripcion" does not match, but "p_print" contains "int".
        assert_eq!(classify_out_kind("descripcion", None), OutKind::Textual);
        assert_eq!(classify_out_kind("p_print", None), OutKind::Numeric);
    }

    #[test]
    fn numeric_type_hint_wins() {
        assert_eq!(classify_out_kind("mensaje", Some("number")), OutKind::Numeric);
        assert_eq!(classify_out_kind("mensaje", Some("NUMBER")), OutKind::Numeric);
        assert_eq!(classify_out_kind("mensaje", Some("integer")), OutKind::Numeric);
    }

    #[test]
    fn string_type_hint_does_not_override_keywords() {
        assert_eq!(classify_out_kind("total", Some("string")), OutKind::Numeric);
    }

    // -- dates ----------------------------------------------------------------

    #[test]
    fn iso_dates_parse() {
        assert_eq!(
            parse_date("2024-03-15"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }

    #[test]
    fn day_first_dates_parse() {
        assert_eq!(
            parse_date("01/02/2024"),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
    }

    #[test]
    fn malformed_dates_do_not_parse() {
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date("2024-1-5"), None);
        assert_eq!(parse_date("2024/01/15"), None);
        assert_eq!(parse_date("15-01-2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn date_named_string_binds_as_date() {
        let p = ParameterDescriptor::input("p_fecha_inicio", json!("2024-03-15"));
        assert_eq!(
            bind_input(&p),
            BindValue::Date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
        );
    }

    #[test]
    fn periodo_named_string_binds_as_date() {
        let p = ParameterDescriptor::input("PERIODO", json!("31/12/2023"));
        assert_eq!(
            bind_input(&p),
            BindValue::Date(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
        );
    }

    #[test]
    fn unparseable_date_falls_back_to_raw_text() {
        let p = ParameterDescriptor::input("fecha", json!("mañana"));
        assert_eq!(bind_input(&p), BindValue::Text("mañana".into()));

        // 31 February is rejected by both layouts and kept verbatim.
        let p = ParameterDescriptor::input("fecha", json!("31/02/2024"));
        assert_eq!(bind_input(&p), BindValue::Text("31/02/2024".into()));
    }

    #[test]
    fn ambiguous_day_month_is_read_day_first() {
        // 03/04/2024 could be March 4th; the binder reads April 3rd.
        let p = ParameterDescriptor::input("fecha", json!("03/04/2024"));
        assert_eq!(
            bind_input(&p),
            BindValue::Date(NaiveDate::from_ymd_opt(2024, 4, 3).unwrap())
        );
    }

    #[test]
    fn non_string_date_candidate_passes_through() {
        let p = ParameterDescriptor::input("fecha", json!(20240315));
        assert_eq!(bind_input(&p), BindValue::Integer(20240315));
    }

    #[test]
    fn date_type_hint_makes_any_name_a_candidate() {
        let p = ParameterDescriptor::input("p_desde", json!("2024-01-01")).with_type("date");
        assert_eq!(
            bind_input(&p),
            BindValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
    }

    #[test]
    fn date_looking_value_without_date_name_stays_text() {
        let p = ParameterDescriptor::input("p_codigo", json!("2024-03-15"));
        assert_eq!(bind_input(&p), BindValue::Text("2024-03-15".into()));
    }

    // -- passthrough ----------------------------------------------------------

    #[test]
    fn scalars_pass_through() {
        assert_eq!(BindValue::from_json(&json!(null)), BindValue::Null);
        assert_eq!(BindValue::from_json(&json!(true)), BindValue::Bool(true));
        assert_eq!(BindValue::from_json(&json!(42)), BindValue::Integer(42));
        assert_eq!(BindValue::from_json(&json!(1.5)), BindValue::Float(1.5));
        assert_eq!(
            BindValue::from_json(&json!("abc")),
            BindValue::Text("abc".into())
        );
    }

    #[test]
    fn composite_values_bind_as_json_text() {
        assert_eq!(
            BindValue::from_json(&json!([1, 2])),
            BindValue::Text("[1,2]".into())
        );
    }

    #[test]
    fn out_parameter_gets_out_slot() {
        let p = ParameterDescriptor::output("total_resultado");
        assert_eq!(
            bind_parameter(&p, 3),
            BindSlot::Out(OutBinding {
                slot_index: 3,
                name: "total_resultado".into(),
                kind: OutKind::Numeric,
            })
        );
    }

    #[test]
    fn blank_buffer_has_full_capacity() {
        let buf = OutBinding::blank_text_buffer();
        assert_eq!(buf.len(), OUT_TEXT_CAPACITY);
        assert!(buf.chars().all(|c| c == ' '));
    }
}
