//! String literal escapes and `$` templates

use crate::ast::StringPart;

/// Interpret the raw content of a string literal
///
/// Handles `\n \t \r \\ \" \' \$` escapes, `$name` and `${name}` templates.
/// A `$` not followed by an identifier is kept literally.
pub fn parse_template(raw: &str) -> Result<Vec<StringPart>, String> {
    let chars: Vec<char> = raw.chars().collect();
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let Some(&escape) = chars.get(i + 1) else {
                    return Err("Incomplete escape sequence at end of string".to_string());
                };
                let escaped = match escape {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '\\' => '\\',
                    '"' => '"',
                    '\'' => '\'',
                    '$' => '$',
                    other => return Err(format!("Invalid escape sequence '\\{}'", other)),
                };
                text.push(escaped);
                i += 2;
            }
            '$' if chars.get(i + 1) == Some(&'{') => {
                let close = chars[i + 2..]
                    .iter()
                    .position(|&c| c == '}')
                    .map(|p| p + i + 2)
                    .ok_or_else(|| "Unterminated '${' template".to_string())?;
                let name: String = chars[i + 2..close].iter().collect();
                let name = name.trim();
                if !is_identifier(name) {
                    return Err(format!(
                        "Unsupported template expression '${{{}}}': only variable names are allowed",
                        name
                    ));
                }
                flush(&mut parts, &mut text);
                parts.push(StringPart::Var(name.to_string()));
                i = close + 1;
            }
            '$' if chars
                .get(i + 1)
                .is_some_and(|c| c.is_alphabetic() || *c == '_') =>
            {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
                    end += 1;
                }
                flush(&mut parts, &mut text);
                parts.push(StringPart::Var(chars[start..end].iter().collect()));
                i = end;
            }
            c => {
                text.push(c);
                i += 1;
            }
        }
    }

    flush(&mut parts, &mut text);
    if parts.is_empty() {
        parts.push(StringPart::Text(String::new()));
    }
    Ok(parts)
}

fn flush(parts: &mut Vec<StringPart>, text: &mut String) {
    if !text.is_empty() {
        parts.push(StringPart::Text(std::mem::take(text)));
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text() {
        assert_eq!(
            parse_template("junit:junit:4.13.2").unwrap(),
            vec![StringPart::Text("junit:junit:4.13.2".to_string())]
        );
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(
            parse_template("").unwrap(),
            vec![StringPart::Text(String::new())]
        );
    }

    #[test]
    fn test_variables() {
        assert_eq!(
            parse_template("org.scala-lang:scala-library:$scalaVersion.5").unwrap(),
            vec![
                StringPart::Text("org.scala-lang:scala-library:".to_string()),
                StringPart::Var("scalaVersion".to_string()),
                StringPart::Text(".5".to_string()),
            ]
        );
        assert_eq!(
            parse_template("scalatest_${scalaBinary}:3.2.6").unwrap(),
            vec![
                StringPart::Text("scalatest_".to_string()),
                StringPart::Var("scalaBinary".to_string()),
                StringPart::Text(":3.2.6".to_string()),
            ]
        );
    }

    #[test]
    fn test_escapes_and_literal_dollar() {
        assert_eq!(
            parse_template(r#"a\$b \"q\" $ 5"#).unwrap(),
            vec![StringPart::Text("a$b \"q\" $ 5".to_string())]
        );
    }

    #[test]
    fn test_errors() {
        assert!(parse_template(r"\q").is_err());
        assert!(parse_template("${open").is_err());
        assert!(parse_template("${a.b}").is_err());
    }
}
