//! Identifier cleaning for client-supplied order fields.

/// Keep only `[A-Za-z0-9_.]`. An empty result means "no ordering".
pub fn sanitize_order_field(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
        .collect()
}

/// True for a plain SQL identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_injection_attempt() {
        assert_eq!(sanitize_order_field("age; DROP TABLE x"), "ageDROPTABLEx");
    }

    #[test]
    fn keeps_qualified_names() {
        assert_eq!(sanitize_order_field("users.created_at"), "users.created_at");
    }

    #[test]
    fn drops_quotes_and_non_ascii() {
        assert_eq!(sanitize_order_field("\"name\"--"), "name");
        assert_eq!(sanitize_order_field("名字"), "");
        assert_eq!(sanitize_order_field("  "), "");
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("created_at"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("a.b"));
        assert!(!is_identifier(""));
    }
}
