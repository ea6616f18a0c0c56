//! Distinguished-name helpers
//!
//! Just enough RFC 4514 to pull the leaf RDN out of a member value and to
//! test whether a DN sits below a search base.

/// Split off the leaf RDN as `(attribute, unescaped value)`
///
/// Returns `None` when the input has no `attr=value` leaf.
pub fn leaf_rdn(dn: &str) -> Option<(String, String)> {
    let leaf = split_unescaped(dn, ',').into_iter().next()?;
    let (attr, value) = leaf.split_once('=')?;
    let attr = attr.trim();
    if attr.is_empty() || attr.contains('\\') {
        return None;
    }
    Some((attr.to_string(), unescape(value.trim())))
}

/// Whether a raw member value looks like a DN rather than a bare identifier
pub fn is_dn(value: &str) -> bool {
    leaf_rdn(value).is_some()
}

/// Whether `dn` is `base` itself or lies anywhere below it
pub fn is_under(dn: &str, base: &str) -> bool {
    let dn = normalize(dn);
    let base = normalize(base);
    if base.is_empty() {
        return true;
    }
    dn == base || dn.ends_with(&format!(",{base}"))
}

/// Undo `\,`-style and `\2C`-style escapes in an attribute value
pub fn unescape(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            if let Some(byte) = hex_pair(bytes, i + 1) {
                out.push(byte);
                i += 3;
            } else {
                out.push(bytes[i + 1]);
                i += 2;
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_pair(bytes: &[u8], at: usize) -> Option<u8> {
    let hi = (*bytes.get(at)? as char).to_digit(16)?;
    let lo = (*bytes.get(at + 1)? as char).to_digit(16)?;
    u8::try_from(hi * 16 + lo).ok()
}

/// Split on `sep` where it is not preceded by a backslash escape
fn split_unescaped(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == sep {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

fn normalize(dn: &str) -> String {
    split_unescaped(dn, ',')
        .into_iter()
        .map(|rdn| match rdn.split_once('=') {
            Some((attr, value)) => format!("{}={}", attr.trim(), value.trim()),
            None => rdn.trim().to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_rdn_plain() {
        assert_eq!(
            leaf_rdn("cn=platform-devs,ou=groups,dc=example,dc=com"),
            Some(("cn".to_string(), "platform-devs".to_string()))
        );
    }

    #[test]
    fn test_leaf_rdn_escaped_comma() {
        assert_eq!(
            leaf_rdn(r"CN=Doe\, Jane,OU=People,DC=corp"),
            Some(("CN".to_string(), "Doe, Jane".to_string()))
        );
        assert_eq!(
            leaf_rdn(r"cn=Doe\2C John,ou=people"),
            Some(("cn".to_string(), "Doe, John".to_string()))
        );
    }

    #[test]
    fn test_leaf_rdn_not_a_dn() {
        assert_eq!(leaf_rdn("alice"), None);
        assert!(!is_dn("alice"));
        assert!(is_dn("uid=alice,ou=people"));
    }

    #[test]
    fn test_unescape_multibyte_hex() {
        assert_eq!(unescape(r"J\C3\BCrgen"), "Jürgen");
        assert_eq!(unescape(r"a\+b"), "a+b");
    }

    #[test]
    fn test_is_under() {
        let base = "ou=Groups, dc=example,dc=com";
        assert!(is_under("cn=devs,ou=groups,dc=example,dc=com", base));
        assert!(is_under("cn=devs,ou=team,ou=groups,dc=example,dc=com", base));
        assert!(!is_under("cn=alice,ou=people,dc=example,dc=com", base));
        assert!(!is_under("cn=x,ou=othergroups,dc=example,dc=com", base));
    }
}
