/// Converts a name to `snake_case`, replacing characters that cannot appear in a Toit
/// identifier with underscores.
pub fn to_snake_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;

    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else if ch.is_ascii_alphanumeric() || ch == '_' {
            result.push(ch);
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        } else {
            result.push('_');
            prev_lower = false;
        }
    }

    result
}

pub fn to_upper_case(name: &str) -> String {
    name.to_ascii_uppercase()
}
