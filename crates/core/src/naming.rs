//! Qualified object names for backend routines.
//!
//! Turns a `(schema, name)` pair from a request into the reference that is
//! spliced into the anonymous call block.

/// Format a procedure or function reference.
///
/// Rules, in priority order:
///
/// - `schema` non-empty: `SCHEMA.NAME`, both upper-cased, unquoted
/// - `name` contains `.` and no `"`: every segment upper-cased and
///   double-quoted, e.g. `"PKG"."PROC"`
/// - otherwise: `NAME` upper-cased
///
/// # Examples
///
/// ```
/// use oragate_core::naming::qualified_name;
///
/// assert_eq!(qualified_name("", "foo"), "FOO");
/// assert_eq!(qualified_name("bar", "foo"), "BAR.FOO");
/// assert_eq!(qualified_name("", "a.b"), "\"A\".\"B\"");
/// ```
pub fn qualified_name(schema: &str, name: &str) -> String {
    if !schema.is_empty() {
        return format!("{}.{}", schema.to_uppercase(), name.to_uppercase());
    }

    if name.contains('.') && !name.contains('"') {
        return name
            .split('.')
            .map(|part| format!("\"{}\"", part.to_uppercase()))
            .collect::<Vec<_>>()
            .join(".");
    }

    name.to_uppercase()
}
