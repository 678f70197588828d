//! HTML status page.
//!
//! A single self-refreshing page showing the latest reading and, while the
//! reading is within the proximity threshold, an alert banner.

use crate::proximity::PROXIMITY_THRESHOLD;
use crate::reading::Reading;
use std::fmt::Write;

/// Opening tag of the alert banner, present if and only if the alert is
/// active. Escaped reading text can never contain `<` or `"`, so a peer
/// cannot forge it.
pub const ALERT_MARKER: &str = "<p class=\"alert\">";

/// Banner text shown inside the marker element.
const ALERT_TEXT: &str = "PROXIMITY ALERT";

/// Seconds between browser refreshes.
pub const REFRESH_SECS: u32 = 2;

/// Shown before the peer has written anything.
const NO_READING: &str = "no reading yet";

/// Render the status page for `reading`.
pub fn render(reading: Option<&Reading>) -> String {
    let alert = reading.is_some_and(|r| r.is_near(PROXIMITY_THRESHOLD));
    let value = reading.map_or(NO_READING.to_string(), |r| escape_html(&r.text));

    let mut html = String::with_capacity(512);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    // Writing to a String cannot fail.
    let _ = writeln!(
        html,
        "<meta http-equiv=\"refresh\" content=\"{}\">",
        REFRESH_SECS
    );
    html.push_str("<title>Distance Relay</title>\n");
    html.push_str(
        "<style>body{font-family:sans-serif;text-align:center}\
         .alert{color:#fff;background:#c00;padding:1em}</style>\n",
    );
    html.push_str("</head>\n<body>\n<h1>Distance Relay</h1>\n");
    let _ = writeln!(html, "<p id=\"reading\">{}</p>", value);
    if alert {
        let _ = writeln!(html, "{}{}</p>", ALERT_MARKER, ALERT_TEXT);
    }
    html.push_str("</body>\n</html>\n");
    html
}

/// Escape the characters that matter inside HTML text.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::parse_payload;

    fn page_for(payload: &str) -> String {
        let reading = parse_payload(payload.as_bytes()).unwrap();
        render(Some(&reading))
    }

    #[test]
    fn test_placeholder_without_reading() {
        let html = render(None);
        assert!(html.contains(NO_READING));
        assert!(!html.contains(ALERT_MARKER));
    }

    #[test]
    fn test_shows_reading_text() {
        let html = page_for("distance:2.5");
        assert!(html.contains("<p id=\"reading\">distance:2.5</p>"));
    }

    #[test]
    fn test_alert_inside_window() {
        assert!(page_for("d:0.5").contains(ALERT_MARKER));
        assert!(page_for("d:1").contains(ALERT_MARKER));
    }

    #[test]
    fn test_no_alert_outside_window() {
        assert!(!page_for("d:0").contains(ALERT_MARKER));
        assert!(!page_for("d:1.5").contains(ALERT_MARKER));
        assert!(!page_for("d:close").contains(ALERT_MARKER));
    }

    #[test]
    fn test_alert_text_in_far_reading_is_not_an_alert() {
        let html = page_for("PROXIMITY ALERT:5");
        assert!(html.contains("<p id=\"reading\">PROXIMITY ALERT:5</p>"));
        assert!(!html.contains(ALERT_MARKER));
    }

    #[test]
    fn test_forged_marker_is_escaped() {
        let html = page_for("<p class=\"alert\">PROXIMITY ALERT</p>:5");
        assert!(!html.contains(ALERT_MARKER));
        assert!(html.contains("&lt;p class=&quot;alert&quot;&gt;"));
    }

    #[test]
    fn test_alert_banner_follows_reading() {
        let html = page_for("d:0.2");
        assert!(html.contains("<p class=\"alert\">PROXIMITY ALERT</p>"));
        assert_eq!(html.matches(ALERT_MARKER).count(), 1);
    }

    #[test]
    fn test_reading_is_escaped() {
        let html = page_for("<b>:x");
        assert!(html.contains("&lt;b&gt;:x"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_page_refreshes() {
        assert!(render(None).contains("http-equiv=\"refresh\" content=\"2\""));
    }
}
