//! CGI response rendering. Pure: builds the bytes written to stdout.

use serde_json::json;

use visitkeep_session::SessionOutcome;

const CRLF: &str = "\r\n";

/// Headers, blank line, then a JSON body describing the visit history.
pub fn render_response(outcome: &SessionOutcome) -> String {
    let snapshot = &outcome.snapshot;
    let body = json!({
        "visit_count": snapshot.visit_count(),
        "last_visit": snapshot.last_visit(),
        "last_visit_message": snapshot.last_visit_message(),
        "tracked": snapshot.is_tracked(),
    });

    let mut out = String::new();
    out.push_str("Content-Type: application/json");
    out.push_str(CRLF);
    if let Some(set_cookie) = outcome.cookie.set_cookie() {
        out.push_str("Set-Cookie: ");
        out.push_str(set_cookie);
        out.push_str(CRLF);
    }
    out.push_str(CRLF);
    out.push_str(&body.to_string());
    out.push('\n');
    out
}

/// Response for a request that could not be served at all.
pub fn render_failure(message: &str) -> String {
    let body = json!({ "error": message });
    format!("Status: 500 Internal Server Error{CRLF}Content-Type: application/json{CRLF}{CRLF}{body}\n")
}
