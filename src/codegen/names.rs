//! Name conversion shared by the backends.
//!
//! Type names come from `Identifier::name`, which mixes styles: resources are
//! already PascalCase (`FamilyMemberHistory`), profiles are usually kebab-case
//! (`familymemberhistory-genetic`). Keyword escaping is language-specific and
//! lives in `RenderProfile`.

/// Convert to PascalCase.
///
/// Any non-alphanumeric character starts a new word and is dropped. Existing
/// capitals inside a word are kept, so `FamilyMemberHistory` round-trips.
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = true;

    for c in s.chars() {
        if !c.is_ascii_alphanumeric() {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }

    result
}

/// Convert to snake_case
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;

    for c in s.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else if c.is_ascii_alphanumeric() || c == '_' {
            result.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        } else {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            prev_lower = false;
        }
    }

    let trimmed = result.trim_end_matches('_');
    let mut result = trimmed.to_string();
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    result
}

/// Whether `s` can be used as a bare identifier in C-like languages
pub fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("familymemberhistory-genetic"), "FamilymemberhistoryGenetic");
        assert_eq!(to_pascal_case("FamilyMemberHistory"), "FamilyMemberHistory");
        assert_eq!(to_pascal_case("vitalsigns"), "Vitalsigns");
        assert_eq!(to_pascal_case("us-core-patient"), "UsCorePatient");
        assert_eq!(to_pascal_case("2fa"), "_2fa");
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("valueQuantity"), "value_quantity");
        assert_eq!(to_snake_case("FamilyMemberHistory"), "family_member_history");
        assert_eq!(to_snake_case("familymemberhistory-genetic"), "familymemberhistory_genetic");
        // All-caps is treated as individual letters
        assert_eq!(to_snake_case("URL"), "url");
        assert_eq!(to_snake_case("value[x]"), "value_x");
    }

    #[test]
    fn test_is_plain_identifier() {
        assert!(is_plain_identifier("status"));
        assert!(is_plain_identifier("_private"));
        assert!(!is_plain_identifier("value[x]"));
        assert!(!is_plain_identifier("1st"));
        assert!(!is_plain_identifier(""));
    }
}
