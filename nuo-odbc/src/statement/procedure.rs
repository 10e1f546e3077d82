/// Splits statement text into words of ASCII alphanumerics and single character punctuation.
/// Whitespace separates tokens and is dropped.
fn tokens(sql: &str) -> impl Iterator<Item = &str> {
    let mut rest = sql;
    std::iter::from_fn(move || {
        rest = rest.trim_start_matches([' ', '\t', '\n', '\r']);
        let first = rest.chars().next()?;
        let end = if first.is_ascii_alphanumeric() {
            rest.find(|c: char| !c.is_ascii_alphanumeric())
                .unwrap_or(rest.len())
        } else {
            first.len_utf8()
        };
        let (token, tail) = rest.split_at(end);
        rest = tail;
        Some(token)
    })
}

fn is_call_keyword(token: &str) -> bool {
    token.eq_ignore_ascii_case("call") || token.eq_ignore_ascii_case("execute")
}

/// `true` if `sql` invokes a stored procedure: `CALL p(...)`, `EXECUTE p`, or the escape
/// sequences `{call p(...)}` and `{? = call p(...)}`.
pub fn is_procedure_call(sql: &str) -> bool {
    let mut tokens = tokens(sql);
    match tokens.next() {
        Some(token) if is_call_keyword(token) => return true,
        Some("{") => (),
        _ => return false,
    }
    let mut token = tokens.next();
    if token == Some("?") {
        if tokens.next() != Some("=") {
            return false;
        }
        token = tokens.next();
    }
    token.is_some_and(is_call_keyword)
}
