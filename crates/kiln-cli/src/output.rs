//! Diagnostic rendering

use colored::Colorize;
use kiln_syntax::{Diagnostic, DiagnosticLevel};

/// Human-readable diagnostic with a colored header line
pub fn render(diagnostic: &Diagnostic) -> String {
    let human = diagnostic.to_human_string();
    let body = human.split_once('\n').map(|(_, rest)| rest).unwrap_or("");

    let level = match diagnostic.level {
        DiagnosticLevel::Error => "error".red().bold(),
        DiagnosticLevel::Warning => "warning".yellow().bold(),
    };
    format!(
        "{}{}: {}\n{}",
        level,
        format!("[{}]", diagnostic.code).bold(),
        diagnostic.message.bold(),
        body
    )
}

/// Print diagnostics to stderr
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{}", render(diagnostic));
    }
}

/// JSON array of diagnostics
pub fn diagnostics_json(diagnostics: &[Diagnostic]) -> serde_json::Value {
    serde_json::to_value(diagnostics).unwrap_or_else(|_| serde_json::Value::Array(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_syntax::Span;

    #[test]
    fn test_render_without_color() {
        colored::control::set_override(false);

        let mut diagnostic =
            Diagnostic::warning_with_code("K3100", "Ignoring unsupported block 'allprojects'", Span::new(0, 11, 1, 1))
                .with_file("build.gradle.kts");
        diagnostic.attach_source("allprojects { }");

        insta::assert_snapshot!(render(&diagnostic), @r###"
        warning[K3100]: Ignoring unsupported block 'allprojects'
          --> build.gradle.kts:1:1
           |
         1 | allprojects { }
           | ^^^^^^^^^^^
        "###);
    }

    #[test]
    fn test_diagnostics_json() {
        let diagnostic = Diagnostic::error_with_code("K3002", "bad coordinate", Span::dummy());
        let json = diagnostics_json(&[diagnostic]);
        assert_eq!(json[0]["code"], "K3002");
        assert_eq!(json[0]["message"], "bad coordinate");
    }
}
