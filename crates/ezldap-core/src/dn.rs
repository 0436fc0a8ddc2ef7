//! Distinguished names
//!
//! A small RFC 4514 parser covering what the directory actually returns:
//! comma-separated `type=value` RDNs, backslash escapes (both `\,` and the
//! two-digit hex form) and insignificant whitespace around separators.
//! RDNs are kept in written order, leaf first.

use std::fmt;

use thiserror::Error;

/// Error returned when a DN string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnParseError {
    #[error("RDN '{0}' has no '=' separator")]
    MissingSeparator(String),

    #[error("RDN '{0}' has an empty attribute type")]
    EmptyType(String),

    #[error("dangling escape at end of '{0}'")]
    DanglingEscape(String),

    #[error("invalid hex escape in '{0}'")]
    InvalidHexEscape(String),
}

/// A single `type=value` component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
    attr_type: String,
    value: String,
}

impl Rdn {
    /// Attribute type as written (e.g. `ou`).
    pub fn attr_type(&self) -> &str {
        &self.attr_type
    }

    /// Unescaped attribute value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attr_type, escape_value(&self.value))
    }
}

/// A parsed distinguished name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DistinguishedName {
    rdns: Vec<Rdn>,
}

impl DistinguishedName {
    /// Parse a DN string. The empty string is the root DN.
    pub fn parse(input: &str) -> Result<Self, DnParseError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut rdns = Vec::new();
        for raw in split_unescaped(input, ',')? {
            let (attr_type, value) = split_once_unescaped(&raw, '=')
                .ok_or_else(|| DnParseError::MissingSeparator(raw.trim().to_string()))?;
            let attr_type = attr_type.trim();
            if attr_type.is_empty() {
                return Err(DnParseError::EmptyType(raw.trim().to_string()));
            }
            rdns.push(Rdn {
                attr_type: attr_type.to_string(),
                value: unescape_value(trim_value(value))?,
            });
        }
        Ok(Self { rdns })
    }

    /// RDNs in written order, leaf first.
    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    /// Number of RDNs.
    pub fn len(&self) -> usize {
        self.rdns.len()
    }

    /// Whether this is the root DN.
    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// The leaf RDN.
    pub fn leaf(&self) -> Option<&Rdn> {
        self.rdns.first()
    }

    /// The ancestor made of the `n` right-most RDNs.
    ///
    /// `prefix(1)` is the top-level entry, `prefix(len())` is the DN itself.
    /// `n` larger than the length yields the full DN.
    pub fn prefix(&self, n: usize) -> DistinguishedName {
        let start = self.rdns.len().saturating_sub(n);
        DistinguishedName {
            rdns: self.rdns[start..].to_vec(),
        }
    }

    /// The direct parent, `None` for the root DN.
    pub fn parent(&self) -> Option<DistinguishedName> {
        if self.rdns.is_empty() {
            None
        } else {
            Some(self.prefix(self.rdns.len() - 1))
        }
    }

    /// Lower-cased canonical form used for comparisons.
    pub fn normalized(&self) -> String {
        self.to_string().to_lowercase()
    }

    /// Whether `self` equals `ancestor` or lies below it.
    pub fn is_within(&self, ancestor: &DistinguishedName) -> bool {
        if ancestor.len() > self.len() {
            return false;
        }
        self.prefix(ancestor.len()).normalized() == ancestor.normalized()
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.rdns.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{rdn}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for DistinguishedName {
    type Err = DnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Normalize a DN string, falling back to a lower-cased trim when the
/// string does not parse.
pub fn normalize(dn: &str) -> String {
    DistinguishedName::parse(dn)
        .map(|parsed| parsed.normalized())
        .unwrap_or_else(|_| dn.trim().to_lowercase())
}

fn split_unescaped(input: &str, sep: char) -> Result<Vec<String>, DnParseError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            let next = chars
                .next()
                .ok_or_else(|| DnParseError::DanglingEscape(input.to_string()))?;
            current.push('\\');
            current.push(next);
        } else if c == sep {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    Ok(parts)
}

fn split_once_unescaped(input: &str, sep: char) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == sep {
            return Some((&input[..i], &input[i + c.len_utf8()..]));
        }
    }
    None
}

/// Strip surrounding whitespace, keeping a trailing space written as `\ `.
fn trim_value(raw: &str) -> &str {
    let start = raw.trim_start();
    let end = start.trim_end();
    let backslashes = end.bytes().rev().take_while(|&b| b == b'\\').count();
    if backslashes % 2 == 0 {
        return end;
    }
    let kept = start[end.len()..].chars().next().map_or(0, char::len_utf8);
    &start[..end.len() + kept]
}

fn unescape_value(raw: &str) -> Result<String, DnParseError> {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let first = chars
            .next()
            .ok_or_else(|| DnParseError::DanglingEscape(raw.to_string()))?;
        if first.is_ascii_hexdigit() {
            let second = chars
                .next()
                .filter(char::is_ascii_hexdigit)
                .ok_or_else(|| DnParseError::InvalidHexEscape(raw.to_string()))?;
            let hex: String = [first, second].iter().collect();
            let byte = u8::from_str_radix(&hex, 16)
                .map_err(|_| DnParseError::InvalidHexEscape(raw.to_string()))?;
            bytes.push(byte);
        } else {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(first.encode_utf8(&mut buf).as_bytes());
        }
    }
    String::from_utf8(bytes).map_err(|_| DnParseError::InvalidHexEscape(raw.to_string()))
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (i, c) in value.chars().enumerate() {
        match c {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                out.push('\\');
                out.push(c);
            }
            '#' if i == 0 => out.push_str("\\#"),
            ' ' if i == 0 || i == last => out.push_str("\\ "),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const OU_DN: &str =
        "ou=Abteilung 1,ou=Referat für Bildung und Sport,o=oubase,dc=example,dc=org";

    #[test]
    fn test_parse_simple_dn() {
        let dn = DistinguishedName::parse(OU_DN).unwrap();
        assert_eq!(dn.len(), 5);
        assert_eq!(dn.rdns()[0].attr_type(), "ou");
        assert_eq!(dn.rdns()[0].value(), "Abteilung 1");
        assert_eq!(dn.rdns()[4].value(), "org");
    }

    #[test]
    fn test_prefix_is_root_first() {
        let dn = DistinguishedName::parse(OU_DN).unwrap();
        assert_eq!(dn.prefix(1).to_string(), "dc=org");
        assert_eq!(dn.prefix(3).to_string(), "o=oubase,dc=example,dc=org");
        assert_eq!(dn.prefix(5).to_string(), OU_DN);
        assert_eq!(dn.prefix(9).to_string(), OU_DN);
    }

    #[test]
    fn test_parent() {
        let dn = DistinguishedName::parse("o=oubase,dc=example,dc=org").unwrap();
        assert_eq!(dn.parent().unwrap().to_string(), "dc=example,dc=org");
        assert!(DistinguishedName::default().parent().is_none());
    }

    #[test]
    fn test_escaped_comma_stays_in_value() {
        let dn = DistinguishedName::parse(r"cn=Lustig\, Peter,o=users,dc=org").unwrap();
        assert_eq!(dn.len(), 3);
        assert_eq!(dn.rdns()[0].value(), "Lustig, Peter");
        assert_eq!(dn.to_string(), r"cn=Lustig\, Peter,o=users,dc=org");
    }

    #[test]
    fn test_hex_escape_decodes_utf8() {
        let dn = DistinguishedName::parse(r"ou=Referat f\C3\BCr Bildung,dc=org").unwrap();
        assert_eq!(dn.rdns()[0].value(), "Referat für Bildung");
    }

    #[test]
    fn test_whitespace_around_separators_is_ignored() {
        let a = DistinguishedName::parse("OU=Abteilung 1 , O=oubase ,DC=org").unwrap();
        let b = DistinguishedName::parse("ou=abteilung 1,o=oubase,dc=org").unwrap();
        assert_eq!(a.normalized(), b.normalized());
    }

    #[test]
    fn test_escaped_trailing_space_is_kept() {
        let dn = DistinguishedName::parse("cn=x\\ ,o=users").unwrap();
        assert_eq!(dn.rdns()[0].value(), "x ");

        let dn = DistinguishedName::parse("cn=x\\   ").unwrap();
        assert_eq!(dn.rdns()[0].value(), "x ");

        // Escaped backslash followed by plain whitespace.
        let dn = DistinguishedName::parse("cn=x\\\\ ").unwrap();
        assert_eq!(dn.rdns()[0].value(), "x\\");
    }

    #[test]
    fn test_values_with_edge_spaces_render_and_parse_back() {
        let dn = DistinguishedName::parse("cn=\\ padded\\ ,o=users").unwrap();
        assert_eq!(dn.rdns()[0].value(), " padded ");

        let rendered = dn.to_string();
        assert_eq!(rendered, "cn=\\ padded\\ ,o=users");
        assert_eq!(DistinguishedName::parse(&rendered).unwrap(), dn);
    }

    #[test]
    fn test_is_within() {
        let child = DistinguishedName::parse(OU_DN).unwrap();
        let base = DistinguishedName::parse("O=OUBASE,dc=example,dc=org").unwrap();
        assert!(child.is_within(&base));
        assert!(base.is_within(&base));
        assert!(!base.is_within(&child));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            DistinguishedName::parse("oubase,dc=org"),
            Err(DnParseError::MissingSeparator(_))
        ));
        assert!(matches!(
            DistinguishedName::parse("=x,dc=org"),
            Err(DnParseError::EmptyType(_))
        ));
        assert!(matches!(
            DistinguishedName::parse(r"cn=x\"),
            Err(DnParseError::DanglingEscape(_))
        ));
        assert!(matches!(
            DistinguishedName::parse(r"cn=\4"),
            Err(DnParseError::InvalidHexEscape(_))
        ));
    }

    #[test]
    fn test_empty_dn() {
        let dn = DistinguishedName::parse("").unwrap();
        assert!(dn.is_empty());
        assert_eq!(dn.to_string(), "");
    }

    #[test]
    fn test_normalize_falls_back_for_garbage() {
        assert_eq!(normalize("  NotADn "), "notadn");
        assert_eq!(normalize("DC=Org"), "dc=org");
    }
}
