use crate::content::decode_base64;
use crate::state::RequestInfo;

/// Separator between command segments: backslash-newline-tab
const SEGMENT_SEPARATOR: &str = " \\\n\t";

/// Build a `curl` command that replays the request.
///
/// `Cookie` headers are left out so session tokens are not copied along.
pub fn curl_command(info: &RequestInfo) -> String {
    let method = info.request_method.as_str();
    let is_head = method.eq_ignore_ascii_case("HEAD");

    let mut base = format!("curl {}", info.url);
    if is_head {
        base.push_str(" --head");
    }

    let mut segments = vec![base];

    if !is_head && !method.eq_ignore_ascii_case("GET") {
        segments.push(format!("-X {}", method));
    }

    if let Some(headers) = &info.request_headers {
        for (key, value) in headers.iter().filter(|(k, _)| *k != "Cookie") {
            segments.push(format!("-H {}", shell_quote(&format!("{}: {}", key, value))));
        }
    }

    if let Some(body) = &info.request_body {
        segments.push(format!("-d {}", shell_quote(&body_text(body))));
    }

    segments.join(SEGMENT_SEPARATOR)
}

/// Request body as text: the decoded payload when it is non-empty UTF-8,
/// otherwise the body string as received
fn body_text(body: &str) -> String {
    decode_base64(body)
        .filter(|bytes| !bytes.is_empty())
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| body.to_string())
}

/// Wrap in single quotes; embedded quotes become `'\''`
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
