/// Escape text for TWB attribute values and text content.
///
/// The dialect writes attributes with single quotes, so both quote
/// characters are escaped along with the structural characters.
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
