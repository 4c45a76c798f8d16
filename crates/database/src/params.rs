use crate::error::DbError;
use core_types::ScalarValue;
use std::collections::HashMap;

/// A statement written with `:name` placeholders, rewritten for PostgreSQL's
/// positional `$n` parameters.
///
/// Values are only ever bound, never spliced into the text. Not treated as
/// placeholders:
/// - `::type` casts (so `:since::date` is the placeholder `since` cast to date)
/// - `\:` (an escaped literal colon)
/// - a colon directly after an identifier character, as in `a:b`
/// - anything inside quoted literals (including `E'...'` escape strings),
///   quoted identifiers, dollar-quoted bodies and comments
///
/// Raw positional parameters (`$1`) in the caller's text are rejected, since
/// they would share numbers with the rewritten placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedStatement {
    sql: String,
    /// `names[i]` is bound to `$i+1`.
    names: Vec<String>,
    /// Byte range of every `$n` written into `sql`, with its zero-based position.
    slots: Vec<(usize, usize, usize)>,
}

impl NamedStatement {
    pub fn parse(statement: &str) -> Result<Self, DbError> {
        let chars: Vec<char> = statement.chars().collect();
        let mut sql = String::with_capacity(statement.len());
        let mut names: Vec<String> = Vec::new();
        let mut slots = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();
            let after_name = i.checked_sub(1).is_some_and(|p| is_name_char(chars[p]));
            match c {
                '\'' | '"' => i = copy_quoted(&chars, i, c, false, &mut sql),
                'E' | 'e' if next == Some('\'') && !after_name => {
                    sql.push(c);
                    i = copy_quoted(&chars, i + 1, '\'', true, &mut sql);
                }
                '-' if next == Some('-') => {
                    let end = find_from(&chars, i, "\n").map_or(chars.len(), |p| p + 1);
                    sql.extend(&chars[i..end]);
                    i = end;
                }
                '/' if next == Some('*') => {
                    let end = find_from(&chars, i + 2, "*/").map_or(chars.len(), |p| p + 2);
                    sql.extend(&chars[i..end]);
                    i = end;
                }
                '$' => match dollar_tag(&chars, i) {
                    Some(tag) => {
                        let body_start = i + tag.chars().count();
                        let end = find_from(&chars, body_start, &tag)
                            .map_or(chars.len(), |p| p + tag.chars().count());
                        sql.extend(&chars[i..end]);
                        i = end;
                    }
                    None if !after_name && next.is_some_and(|n| n.is_ascii_digit()) => {
                        let end = (i + 1..chars.len())
                            .find(|&p| !chars[p].is_ascii_digit())
                            .unwrap_or(chars.len());
                        let raw: String = chars[i..end].iter().collect();
                        return Err(DbError::QueryExecution(format!(
                            "Positional parameter '{raw}' is not supported; use :name placeholders"
                        )));
                    }
                    None => {
                        sql.push(c);
                        i += 1;
                    }
                },
                '\\' if next == Some(':') => {
                    sql.push(':');
                    i += 2;
                }
                ':' if next == Some(':') => {
                    sql.push_str("::");
                    i += 2;
                }
                ':' if next.is_some_and(is_name_start) && !after_name => {
                    let start = i + 1;
                    let mut end = start;
                    while end < chars.len() && is_name_char(chars[end]) {
                        end += 1;
                    }
                    let name: String = chars[start..end].iter().collect();
                    let position = match names.iter().position(|n| *n == name) {
                        Some(p) => p,
                        None => {
                            names.push(name);
                            names.len() - 1
                        }
                    };
                    let start_byte = sql.len();
                    sql.push('$');
                    sql.push_str(&(position + 1).to_string());
                    slots.push((start_byte, sql.len(), position));
                    i = end;
                }
                _ => {
                    sql.push(c);
                    i += 1;
                }
            }
        }

        Ok(Self { sql, names, slots })
    }

    /// The rewritten text, ready for the engine.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The rewritten text with some parameters sent as text and converted by
    /// the server. `casts[i]` names the target type for `$i+1`; a `None`
    /// leaves that parameter as it is.
    pub fn sql_with_casts(&self, casts: &[Option<String>]) -> String {
        let mut out = String::with_capacity(self.sql.len());
        let mut last = 0;
        for &(start, end, position) in &self.slots {
            out.push_str(&self.sql[last..start]);
            let placeholder = &self.sql[start..end];
            match casts.get(position) {
                Some(Some(target)) => {
                    out.push_str(&format!("CAST(CAST({placeholder} AS text) AS {target})"))
                }
                _ => out.push_str(placeholder),
            }
            last = end;
        }
        out.push_str(&self.sql[last..]);
        out
    }

    /// Placeholder names in positional order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Orders the caller's values by position. Parameters the statement does
    /// not mention are ignored; a placeholder with no value is an error.
    pub fn bind(&self, params: &HashMap<String, ScalarValue>) -> Result<Vec<ScalarValue>, DbError> {
        self.names
            .iter()
            .map(|name| {
                params.get(name).cloned().ok_or_else(|| {
                    DbError::QueryExecution(format!(
                        "A value is required for bind parameter '{name}'"
                    ))
                })
            })
            .collect()
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Copies a quoted run starting at `start` (doubled quotes stay inside) and
/// returns the index just past the closing quote. With `backslash_escapes`
/// a backslash also keeps the next character inside the literal.
fn copy_quoted(
    chars: &[char],
    start: usize,
    quote: char,
    backslash_escapes: bool,
    out: &mut String,
) -> usize {
    out.push(quote);
    let mut i = start + 1;
    while i < chars.len() {
        out.push(chars[i]);
        if backslash_escapes && chars[i] == '\\' {
            if let Some(&escaped) = chars.get(i + 1) {
                out.push(escaped);
            }
            i += 2;
            continue;
        }
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                out.push(quote);
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    i
}

/// Recognises `$$` or `$tag$` at `start`. `$1` is a positional parameter, not
/// a tag.
fn dollar_tag(chars: &[char], start: usize) -> Option<String> {
    let mut end = start + 1;
    if chars.get(end).is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    while end < chars.len() && is_name_char(chars[end]) {
        end += 1;
    }
    if chars.get(end) == Some(&'$') {
        Some(chars[start..=end].iter().collect())
    } else {
        None
    }
}

fn find_from(chars: &[char], from: usize, needle: &str) -> Option<usize> {
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() || from >= chars.len() {
        return None;
    }
    chars[from..]
        .windows(needle.len())
        .position(|w| w == needle.as_slice())
        .map(|p| p + from)
}
