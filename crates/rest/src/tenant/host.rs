//! Host header normalization.

/// Hosts that always resolve to the root tenant under the localhost rule.
pub const LOOPBACK_ALIASES: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0"];

/// Strips an optional trailing `:port` (possibly empty) and lower-cases the
/// host.
///
/// Bracketed IPv6 literals keep their brackets. Unbracketed hosts with more
/// than one colon are left as they are.
///
/// ```
/// use canopy_rest::tenant::normalize_host;
///
/// assert_eq!(normalize_host("Acme.Example:8443"), "acme.example");
/// assert_eq!(normalize_host("[::1]:3000"), "[::1]");
/// assert_eq!(normalize_host(" localhost "), "localhost");
/// ```
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let without_port = match host.rfind(':') {
        Some(idx)
            if host[idx + 1..].bytes().all(|b| b.is_ascii_digit())
                && if host.starts_with('[') {
                    host[..idx].ends_with(']')
                } else {
                    !host[..idx].contains(':')
                } =>
        {
            &host[..idx]
        }
        _ => host,
    };
    without_port.to_lowercase()
}

/// Returns `true` for the fixed loopback aliases.
pub fn is_loopback(host: &str) -> bool {
    LOOPBACK_ALIASES.contains(&host)
}

/// Returns the first dot-delimited label of `host`.
pub fn first_label(host: &str) -> &str {
    host.split('.').next().unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_port_and_case() {
        assert_eq!(normalize_host("ACME.example"), "acme.example");
        assert_eq!(normalize_host("acme.example:80"), "acme.example");
        assert_eq!(normalize_host("localhost:3000"), "localhost");
        assert_eq!(normalize_host("acme.example:"), "acme.example");
        assert_eq!(normalize_host("Acme.Example:"), "acme.example");
        assert_eq!(normalize_host("acme.example:http"), "acme.example:http");
    }

    #[test]
    fn test_normalize_ipv6() {
        assert_eq!(normalize_host("[::1]"), "[::1]");
        assert_eq!(normalize_host("[::1]:8080"), "[::1]");
        assert_eq!(normalize_host("[::1]:"), "[::1]");
        assert_eq!(normalize_host("::1"), "::1");
    }

    #[test]
    fn test_loopback() {
        assert!(is_loopback("localhost"));
        assert!(is_loopback("127.0.0.1"));
        assert!(is_loopback("0.0.0.0"));
        assert!(!is_loopback("acme.localhost"));
    }

    #[test]
    fn test_first_label() {
        assert_eq!(first_label("acme.localhost"), "acme");
        assert_eq!(first_label("localhost"), "localhost");
        assert_eq!(first_label(""), "");
    }
}
