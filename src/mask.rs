/// Mask a username for public display.
///
/// Short names stay recognizable to their owner without exposing the full
/// handle: a single character is returned unchanged, names up to four
/// characters keep only the first, and longer names keep the first three
/// and the last. Counts characters, not bytes.
pub fn mask_username(username: &str) -> String {
    let chars: Vec<char> = username.chars().collect();
    let len = chars.len();

    if len <= 1 {
        return username.to_string();
    }
    if len <= 4 {
        let mut masked = chars[0].to_string();
        masked.push_str(&"*".repeat(len - 1));
        return masked;
    }

    let head: String = chars[..3].iter().collect();
    let tail = chars[len - 1];
    format!("{head}{}{tail}", "*".repeat(len - 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_single_char_unchanged() {
        assert_eq!(mask_username(""), "");
        assert_eq!(mask_username("x"), "x");
    }

    #[test]
    fn short_names_keep_first_char() {
        assert_eq!(mask_username("ab"), "a*");
        assert_eq!(mask_username("abc"), "a**");
        assert_eq!(mask_username("abcd"), "a***");
    }

    #[test]
    fn five_chars_switches_to_long_form() {
        assert_eq!(mask_username("abcde"), "abc*e");
        assert_eq!(mask_username("abcdef"), "abc**f");
    }

    #[test]
    fn long_name() {
        assert_eq!(mask_username("UsernameA"), "Use*****A");
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(mask_username("héllo"), "hél*o");
        assert_eq!(mask_username("日本"), "日*");
    }
}
