//! Translation of raw backend errors into user-facing messages.
//!
//! Only a handful of well-known Oracle signatures are rewritten; every other
//! message passes through unchanged.

use crate::procedure::RoutineKind;

/// Identifier must be declared: the routine does not exist or is not visible.
pub const SIG_OBJECT_NOT_FOUND: &str = "PLS-00201";
/// Wrong number or types of arguments in call.
pub const SIG_WRONG_ARGUMENTS: &str = "PLS-00306";
/// Numeric or value error.
pub const SIG_VALUE_ERROR: &str = "ORA-06502";
/// No data found.
pub const SIG_NO_DATA_FOUND: &str = "ORA-01403";

/// Category of a recognized backend error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownBackendError {
    ObjectNotFound,
    WrongArguments,
    TypeConversion,
    NoDataFound,
}

/// Find the first known signature in a raw message.
///
/// Signatures are checked from the most specific to the most generic:
/// PL/SQL compilation errors come wrapped in `ORA-06550`, and a missing
/// routine also tends to mention `ORA-06550`, so the `PLS-` codes decide.
pub fn classify(raw: &str) -> Option<KnownBackendError> {
    if raw.contains(SIG_OBJECT_NOT_FOUND) {
        Some(KnownBackendError::ObjectNotFound)
    } else if raw.contains(SIG_WRONG_ARGUMENTS) {
        Some(KnownBackendError::WrongArguments)
    } else if raw.contains(SIG_VALUE_ERROR) {
        Some(KnownBackendError::TypeConversion)
    } else if raw.contains(SIG_NO_DATA_FOUND) {
        Some(KnownBackendError::NoDataFound)
    } else {
        None
    }
}

/// Rewrite `raw` for a call to routine `name` of the given kind.
pub fn translate(raw: &str, name: &str, kind: RoutineKind) -> String {
    match classify(raw) {
        Some(KnownBackendError::ObjectNotFound) => format!(
            "{kind} '{name}' not found. Verify that it exists in the database."
        ),
        Some(KnownBackendError::WrongArguments) => format!(
            "Incorrect parameters for '{name}'. Verify parameter types and count."
        ),
        Some(KnownBackendError::TypeConversion) => {
            "Type conversion error. Verify that the data types are correct.".to_string()
        }
        Some(KnownBackendError::NoDataFound) => format!(
            "No data found. The {} returned no results.",
            kind.to_string().to_lowercase()
        ),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOT_FOUND_RAW: &str = "ORA-06550: line 1, column 13:\n\
        PLS-00201: identifier 'CALC_TOTAL' must be declared\n\
        ORA-06550: line 1, column 7:\nPL/SQL: Statement ignored";

    #[test]
    fn missing_function_mentions_name_and_kind() {
        let msg = translate(NOT_FOUND_RAW, "CALC_TOTAL", RoutineKind::Function);
        assert_eq!(
            msg,
            "Function 'CALC_TOTAL' not found. Verify that it exists in the database."
        );
    }

    #[test]
    fn missing_procedure_uses_procedure_label() {
        let msg = translate(NOT_FOUND_RAW, "p_x", RoutineKind::Procedure);
        assert!(msg.starts_with("Procedure 'p_x' not found"));
    }

    #[test]
    fn wrong_arguments_is_rewritten() {
        let raw = "ORA-06550: line 1, column 7:\nPLS-00306: wrong number or types of arguments in call to 'P'";
        assert_eq!(
            translate(raw, "P", RoutineKind::Procedure),
            "Incorrect parameters for 'P'. Verify parameter types and count."
        );
    }

    #[test]
    fn value_error_is_rewritten() {
        let raw = "ORA-06502: PL/SQL: numeric or value error: character to number conversion error";
        assert_eq!(
            translate(raw, "P", RoutineKind::Procedure),
            "Type conversion error. Verify that the data types are correct."
        );
    }

    #[test]
    fn no_data_found_uses_lower_case_kind() {
        let raw = "ORA-01403: no data found\nORA-06512: at \"HR.F\", line 5";
        assert_eq!(
            translate(raw, "F", RoutineKind::Function),
            "No data found. The function returned no results."
        );
    }

    #[test]
    fn unknown_errors_pass_through() {
        let raw = "ORA-12541: TNS:no listener";
        assert_eq!(translate(raw, "P", RoutineKind::Procedure), raw);
        assert_eq!(classify(raw), None);
    }

    #[test]
    fn not_found_takes_precedence_over_other_signatures() {
        let raw = "PLS-00306 then PLS-00201";
        assert_eq!(classify(raw), Some(KnownBackendError::ObjectNotFound));
    }
}
