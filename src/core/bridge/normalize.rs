/// Rewrite line endings for the terminal display.
///
/// Every CR is dropped, then every LF becomes CRLF. Stripping first keeps
/// device CRLF from turning into CRCRLF, which also makes the function
/// idempotent.
pub fn normalize_output(text: &str) -> String {
    text.replace('\r', "").replace('\n', "\r\n")
}
