use base64::Engine;

pub fn parse_data_uri(input: &str) -> Option<String> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(rest) = s.strip_prefix("data:") {
        // data:image/png;base64,....
        let (_, b64) = rest.split_once(',')?;
        return Some(b64.trim().to_string());
    }
    // assume plain base64
    Some(s.to_string())
}

pub fn b64_decode(input: &str) -> Option<Vec<u8>> {
    let b64 = parse_data_uri(input)?;
    let engine = base64::engine::general_purpose::STANDARD;
    engine.decode(b64.as_bytes()).ok()
}

/// Filename-safe slug: lowercase, non-alphanumerics collapsed to single
/// hyphens, truncated to 30 characters. Empty titles fall back to "bien".
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_dash = false;
    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_dash = false;
        } else if !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }
    out.truncate(30);
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("bien");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_basic() {
        assert_eq!(slug("Villa Marina"), "villa-marina");
        assert_eq!(slug("Penthouse – Palm Jumeirah!"), "penthouse-palm-jumeirah");
    }

    #[test]
    fn slug_collapses_and_truncates() {
        assert_eq!(slug("A   --  B"), "a-b");
        let long = slug("this is a very long property title that keeps going");
        assert!(long.len() <= 30);
        assert!(!long.ends_with('-'));
        assert!(long
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn slug_empty_falls_back() {
        assert_eq!(slug(""), "bien");
        assert_eq!(slug("!!!"), "bien");
    }

    #[test]
    fn data_uri_roundtrip() {
        let b = b64_decode("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(b, b"hello");
        assert!(b64_decode("").is_none());
    }
}
