//! Safety checks for untrusted inline SVG icon markup.
//!
//! Icon payloads arrive inside client-supplied documents and end up
//! embedded in composites and exported SVG. Markup that fails
//! [`validate_icon_markup`] is never painted; the compositor degrades the
//! layer to a named placeholder instead. The check is deliberately
//! fail-closed: anything that merely looks like active content is rejected.

use std::fmt;

/// Markup larger than this is rejected outright.
pub const MAX_ICON_MARKUP_BYTES: usize = 16 * 1024;

/// Element names that must not appear in icon markup.
const FORBIDDEN_ELEMENTS: [&str; 6] = [
    "script",
    "style",
    "foreignobject",
    "iframe",
    "object",
    "embed",
];

/// URL schemes that must not appear anywhere in the markup.
const FORBIDDEN_URLS: [&str; 2] = ["javascript:", "data:text/html"];

/// Why a piece of icon markup was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconViolation {
    /// Markup exceeds [`MAX_ICON_MARKUP_BYTES`].
    TooLarge,
    /// Markup is not a single `<svg>` element.
    NotSvg,
    /// Markup contains a forbidden element such as `<script>`.
    ForbiddenElement(&'static str),
    /// Markup contains an event-handler attribute (`onload=`, `onclick=`, ...).
    EventHandler,
    /// Markup contains a forbidden URL scheme such as `javascript:`.
    ForbiddenUrl(&'static str),
}

impl fmt::Display for IconViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge => write!(f, "markup exceeds {MAX_ICON_MARKUP_BYTES} bytes"),
            Self::NotSvg => write!(f, "markup is not a single <svg> element"),
            Self::ForbiddenElement(name) => write!(f, "markup contains a <{name}> element"),
            Self::EventHandler => write!(f, "markup contains an event-handler attribute"),
            Self::ForbiddenUrl(scheme) => write!(f, "markup contains a {scheme} URL"),
        }
    }
}

/// Check icon markup, reporting the first violation found.
///
/// # Errors
///
/// Returns the [`IconViolation`] that caused rejection.
pub fn validate_icon_markup(markup: &str) -> Result<(), IconViolation> {
    if markup.len() > MAX_ICON_MARKUP_BYTES {
        return Err(IconViolation::TooLarge);
    }

    let lower = markup.trim().to_ascii_lowercase();
    if !lower.starts_with("<svg") || !lower.ends_with("</svg>") {
        return Err(IconViolation::NotSvg);
    }

    for element in FORBIDDEN_ELEMENTS {
        if lower.contains(&format!("<{element}")) {
            return Err(IconViolation::ForbiddenElement(element));
        }
    }
    if has_event_handler(&lower) {
        return Err(IconViolation::EventHandler);
    }
    for scheme in FORBIDDEN_URLS {
        if lower.contains(scheme) {
            return Err(IconViolation::ForbiddenUrl(scheme));
        }
    }
    Ok(())
}

/// Whether markup may be embedded in a composite.
#[must_use]
pub fn is_safe_icon_markup(markup: &str) -> bool {
    validate_icon_markup(markup).is_ok()
}

/// Scan for `on…=` attributes. `lower` is already lowercased. Attribute
/// names in SVG containing "on" mid-word (`stroke-linejoin`, `none`) are
/// not flagged because the match must follow whitespace, a quote, or a
/// tag delimiter.
fn has_event_handler(lower: &str) -> bool {
    let bytes = lower.as_bytes();
    let mut from = 0;
    while let Some(found) = lower[from..].find("on") {
        let start = from + found;
        let boundary = start == 0
            || matches!(
                bytes[start - 1],
                b' ' | b'\t' | b'\n' | b'\r' | b'"' | b'\'' | b'<' | b'/'
            );
        if boundary {
            let rest = &lower[start + 2..];
            let name_len = rest.bytes().take_while(u8::is_ascii_alphabetic).count();
            if name_len > 0 && rest[name_len..].trim_start().starts_with('=') {
                return true;
            }
        }
        from = start + 2;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOMATO: &str = r##"<svg viewBox="0 0 24 24" fill="none"><circle cx="12" cy="14" r="8" fill="#e53935"/><path d="M12 6c1-2 3-3 5-3-1 2-3 3-5 3z" fill="#43a047"/></svg>"##;

    #[test]
    fn plain_palette_icons_pass() {
        assert!(is_safe_icon_markup(TOMATO));
    }

    #[test]
    fn stroke_attributes_containing_on_are_not_flagged() {
        let markup = r#"<svg viewBox="0 0 24 24"><path d="M2 2l20 20" stroke="none" stroke-linejoin="round"/></svg>"#;
        assert!(is_safe_icon_markup(markup));
    }

    #[test]
    fn script_elements_are_rejected() {
        let markup = r#"<svg><script>alert(1)</script></svg>"#;
        assert_eq!(
            validate_icon_markup(markup),
            Err(IconViolation::ForbiddenElement("script"))
        );
    }

    #[test]
    fn foreign_object_is_rejected_case_insensitively() {
        let markup = r#"<svg><foreignObject><body>x</body></foreignObject></svg>"#;
        assert_eq!(
            validate_icon_markup(markup),
            Err(IconViolation::ForbiddenElement("foreignobject"))
        );
    }

    #[test]
    fn event_handler_attributes_are_rejected() {
        let markup = r#"<svg onload="alert(1)"><circle r="4"/></svg>"#;
        assert_eq!(
            validate_icon_markup(markup),
            Err(IconViolation::EventHandler)
        );

        let spaced = r#"<svg ONCLICK = "alert(1)"><circle r="4"/></svg>"#;
        assert_eq!(
            validate_icon_markup(spaced),
            Err(IconViolation::EventHandler)
        );
    }

    #[test]
    fn javascript_urls_are_rejected() {
        let markup = r#"<svg><a href="javascript:alert(1)"><text>hi</text></a></svg>"#;
        assert_eq!(
            validate_icon_markup(markup),
            Err(IconViolation::ForbiddenUrl("javascript:"))
        );
    }

    #[test]
    fn data_html_urls_are_rejected() {
        let markup = r#"<svg><image href="data:text/html,<script>1</script>"/></svg>"#;
        assert!(matches!(
            validate_icon_markup(markup),
            Err(IconViolation::ForbiddenElement("script") | IconViolation::ForbiddenUrl(_))
        ));
    }

    #[test]
    fn non_svg_markup_is_rejected() {
        assert_eq!(
            validate_icon_markup("<div>not an icon</div>"),
            Err(IconViolation::NotSvg)
        );
        assert_eq!(validate_icon_markup(""), Err(IconViolation::NotSvg));
    }

    #[test]
    fn oversize_markup_is_rejected() {
        let mut markup = String::from("<svg>");
        markup.push_str(&"<circle r=\"1\"/>".repeat(2048));
        markup.push_str("</svg>");
        assert!(markup.len() > MAX_ICON_MARKUP_BYTES);
        assert_eq!(validate_icon_markup(&markup), Err(IconViolation::TooLarge));
    }
}
