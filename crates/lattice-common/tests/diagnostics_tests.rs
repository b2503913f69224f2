use super::*;

#[test]
fn test_severity_names() {
    assert_eq!(DiagnosticSeverity::Error.name(), "error");
    assert_eq!(DiagnosticSeverity::Warning.to_string(), "warning");
    assert!(DiagnosticSeverity::Error.is_error());
    assert!(!DiagnosticSeverity::Error.is_warning());
}

#[test]
fn test_format_message_replaces_positional_args() {
    let text = format_message("{0} is not assignable to {1}", &["Dog", "Cat"]);
    assert_eq!(text, "Dog is not assignable to Cat");
}

#[test]
fn test_from_code_uses_table_severity() {
    let diag = Diagnostic::from_code(
        "pkg/a.unit.json",
        diagnostic_codes::NON_ASCII_FILE_NAME,
        &["pkg/é.unit.json"],
    );
    assert!(diag.is_warning());
    assert_eq!(
        diag.message,
        "source file name has non-ASCII characters: pkg/é.unit.json"
    );
}

#[test]
fn test_from_code_unknown_code_is_error() {
    let diag = Diagnostic::from_code("a", 42, &["something", "odd"]);
    assert!(diag.is_error());
    assert_eq!(diag.message, "something odd");
}

#[test]
fn test_format_simple() {
    let diag = Diagnostic::error("a", "Dog is not assignable to Cat", 4001);
    assert_eq!(diag.format_simple(), "error[L4001]: Dog is not assignable to Cat");
    assert_eq!(diag.to_string(), diag.format_simple());
}

#[test]
fn test_bag_counts() {
    let mut bag = DiagnosticBag::with_file("pkg/a.unit.json");
    bag.report(diagnostic_codes::NOT_ASSIGNABLE, "check #0", &["A", "B"]);
    bag.report(diagnostic_codes::UNUSED_DECLARATION, "Helper", &["Helper"]);
    bag.warning("plain warning", 1);

    assert_eq!(bag.len(), 3);
    assert_eq!(bag.error_count(), 1);
    assert_eq!(bag.warning_count(), 2);
    assert!(bag.has_errors());
    assert_eq!(bag.errors().count(), 1);
    assert_eq!(bag.for_subject("check #0").count(), 1);
    assert!(bag.iter().all(|d| d.file_name == "pkg/a.unit.json"));
}

#[test]
fn test_every_code_has_a_message() {
    use diagnostic_codes::*;
    for code in [
        NON_ASCII_FILE_NAME,
        IDENTICAL_SOURCE_FILES,
        TYPE_NOT_FOUND,
        CIRCULAR_ALIAS,
        VARIANCE_VIOLATION,
        NOT_ASSIGNABLE,
        CASES_DO_NOT_COVER,
        MODULE_CYCLE,
        UNUSED_DECLARATION,
        PHASE_FAILURE,
    ] {
        assert!(get_message(code).is_some(), "missing message for {code}");
    }
}

#[test]
fn test_diagnostic_serializes_without_empty_fields() {
    let diag = Diagnostic::error("a", "m", 1);
    let json = serde_json::to_string(&diag).unwrap();
    assert!(!json.contains("related"));
    assert!(!json.contains("subject"));
    assert!(json.contains("\"severity\":\"error\""));
}
