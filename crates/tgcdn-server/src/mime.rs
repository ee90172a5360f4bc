//! Magic-number MIME sniffing for the `/upload` and `/content` boundary.
//! A declared `Content-Type` is never trusted on its own — every accepted
//! body must also sniff to one of these prefixes, and for uploads the
//! sniffed type must agree with what the client declared.

/// `(mime, magic prefix)`. WEBP additionally requires bytes 8..12 to read
/// `WEBP`, checked separately since `RIFF` alone is ambiguous.
const MAGIC_PREFIXES: &[(&str, &[u8])] = &[
    ("image/png", b"\x89PNG\r\n\x1a\n"),
    ("image/jpeg", b"\xFF\xD8\xFF"),
    ("image/gif", b"GIF8"),
    ("image/bmp", b"BM"),
];

const RIFF_PREFIX: &[u8] = b"RIFF";
const WEBP_MARKER: &[u8] = b"WEBP";

pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
];

/// Sniffs the first bytes of a body (reading up to the first 1024 bytes is
/// enough for every prefix here) and returns the matching canonical MIME
/// type, or `None` if nothing in the whitelist matches.
pub fn sniff(prefix: &[u8]) -> Option<&'static str> {
    if prefix.len() >= 12 && prefix.starts_with(RIFF_PREFIX) && &prefix[8..12] == WEBP_MARKER {
        return Some("image/webp");
    }
    for (mime, magic) in MAGIC_PREFIXES {
        if prefix.starts_with(magic) {
            return Some(mime);
        }
    }
    None
}

pub fn is_allowed_content_type(content_type: &str) -> bool {
    ALLOWED_CONTENT_TYPES.contains(&content_type)
}

/// A client can declare any `Content-Type` it likes; this confirms the
/// bytes actually match it, not just that both independently happen to be
/// whitelisted. A PNG body declared as `image/jpeg` sniffs fine on its own
/// but must still be rejected here.
pub fn sniff_matches_declared(prefix: &[u8], declared: &str) -> bool {
    sniff(prefix) == Some(declared)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_png() {
        assert_eq!(sniff(b"\x89PNG\r\n\x1a\nrest"), Some("image/png"));
    }

    #[test]
    fn sniffs_jpeg() {
        assert_eq!(sniff(b"\xFF\xD8\xFFrest"), Some("image/jpeg"));
    }

    #[test]
    fn sniffs_webp_requires_marker() {
        let mut body = b"RIFF".to_vec();
        body.extend_from_slice(&[0u8; 4]);
        body.extend_from_slice(b"WEBP");
        assert_eq!(sniff(&body), Some("image/webp"));

        let not_webp = b"RIFFxxxxAVI ".to_vec();
        assert_eq!(sniff(&not_webp), None);
    }

    #[test]
    fn rejects_unknown() {
        assert_eq!(sniff(b"plain text body"), None);
    }

    #[test]
    fn rejects_spoofed_content_type() {
        // A PNG body sniffs fine; a claimed but absent jpeg header must not.
        assert_eq!(sniff(b"not a real image"), None);
        assert!(is_allowed_content_type("image/jpeg"));
        assert!(!is_allowed_content_type("text/html"));
    }

    #[test]
    fn rejects_sniff_mismatch_with_declared_type() {
        let png_bytes = b"\x89PNG\r\n\x1a\nrest";
        assert!(sniff_matches_declared(png_bytes, "image/png"));
        assert!(!sniff_matches_declared(png_bytes, "image/jpeg"));
    }
}
