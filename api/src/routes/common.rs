use validator::{ValidationErrors, ValidationErrorsKind};

/// Joins the messages of every failed validation, nested structs and lists
/// included, with `"; "`.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages(errors, &mut messages);
    messages.sort();
    messages.join("; ")
}

fn collect_messages(errors: &ValidationErrors, out: &mut Vec<String>) {
    for kind in errors.errors().values() {
        match kind {
            ValidationErrorsKind::Field(errs) => out.extend(
                errs.iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string())),
            ),
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, out),
            ValidationErrorsKind::List(items) => {
                for inner in items.values() {
                    collect_messages(inner, out);
                }
            }
        }
    }
}
