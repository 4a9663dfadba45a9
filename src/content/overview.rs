use crate::content::classify::Classifier;
use crate::content::keyvalue::KeyValueRepresentation;
use crate::state::RequestInfo;

/// Plain-text summary of one exchange, as shown in the overview pane and
/// written to exported logs.
///
/// Starts with `METHOD URL` and the response code; URL parameters, request
/// headers, request body and response body follow as labelled sections, each
/// only when it has content.
pub fn overview(info: &RequestInfo, classifier: &Classifier) -> String {
    let mut out = format!(
        "{} {}\n\nResponse Code: {}",
        info.request_method,
        info.url,
        info.status_code.as_deref().unwrap_or("")
    );

    push_section(
        &mut out,
        "URL Parameters",
        &KeyValueRepresentation::from_url(&info.url).raw_text(),
    );

    if let Some(headers) = &info.request_headers {
        push_section(
            &mut out,
            "Request Headers",
            &KeyValueRepresentation::from_headers(headers).raw_text(),
        );
    }

    if let Some(rep) = info
        .request_body
        .as_deref()
        .and_then(|body| classifier.classify_encoded(body))
    {
        push_section(&mut out, "Request Body", rep.text().unwrap_or_default());
    }

    if let Some(rep) = info
        .response_data
        .as_deref()
        .and_then(|body| classifier.classify_encoded(body))
    {
        push_section(&mut out, "Response Body", rep.text().unwrap_or_default());
    }

    out
}

fn push_section(out: &mut String, label: &str, content: &str) {
    if content.is_empty() {
        return;
    }
    out.push_str("\n\n");
    out.push_str(label);
    out.push_str(":\n");
    out.push_str(content);
}
