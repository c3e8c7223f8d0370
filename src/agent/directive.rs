use serde_json::{Map, Value};

const TOOL_MARKER: &str = "TOOL_USE:";
const PARAMS_MARKER: &str = "PARAMETERS:";

/// A tool invocation extracted from one completion. Transient: consumed by
/// dispatch within the same turn, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDirective {
    pub tool_name: String,
    pub parameters: Map<String, Value>,
}

/// Scan free text for the first structurally complete
/// `TOOL_USE: <name> PARAMETERS: <json-object>` fragment (whitespace,
/// including newlines, allowed between tokens). On a hit, returns the
/// directive and the text with the fragment stripped. A fragment whose
/// parameters fail to decode as a JSON object degrades to "no directive";
/// the caller keeps the original text untouched. Malformed input is worse
/// than no tool call, never a fault.
pub fn parse_directive(text: &str) -> Option<(ToolDirective, String)> {
    let (start, tool_name, params_start) = find_directive(text)?;

    // Decode exactly one JSON value; the stream's byte offset bounds the
    // fragment so nested objects and trailing prose both work.
    let mut stream = serde_json::Deserializer::from_str(&text[params_start..]).into_iter::<Value>();
    let parameters = match stream.next() {
        Some(Ok(Value::Object(map))) => map,
        _ => return None,
    };
    let end = params_start + stream.byte_offset();

    let mut clean = String::with_capacity(text.len());
    clean.push_str(&text[..start]);
    clean.push_str(&text[end..]);

    Some((
        ToolDirective { tool_name, parameters },
        clean.trim().to_string(),
    ))
}

/// First occurrence of the full marker sequence. Incomplete fragments (no
/// identifier, missing PARAMETERS, no object literal) are skipped so a later
/// complete directive can still match.
fn find_directive(text: &str) -> Option<(usize, String, usize)> {
    let mut from = 0;
    while let Some(rel) = text[from..].find(TOOL_MARKER) {
        let start = from + rel;
        if let Some(found) = directive_at(text, start) {
            return Some(found);
        }
        from = start + TOOL_MARKER.len();
    }
    None
}

fn directive_at(text: &str, start: usize) -> Option<(usize, String, usize)> {
    let pos = skip_whitespace(text, start + TOOL_MARKER.len());
    let name_end = identifier_end(text, pos);
    if name_end == pos {
        return None;
    }
    let tool_name = text[pos..name_end].to_string();

    let pos = skip_whitespace(text, name_end);
    if !text[pos..].starts_with(PARAMS_MARKER) {
        return None;
    }
    let pos = skip_whitespace(text, pos + PARAMS_MARKER.len());
    if !text[pos..].starts_with('{') {
        return None;
    }
    Some((start, tool_name, pos))
}

fn skip_whitespace(text: &str, mut pos: usize) -> usize {
    while let Some(c) = text[pos..].chars().next() {
        if !c.is_whitespace() {
            break;
        }
        pos += c.len_utf8();
    }
    pos
}

fn identifier_end(text: &str, mut pos: usize) -> usize {
    while let Some(c) = text[pos..].chars().next() {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            break;
        }
        pos += c.len_utf8();
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_directive_and_clean_text() {
        let text = r#"Sure! TOOL_USE: calculator PARAMETERS: {"expression": "2+2"}"#;
        let (directive, clean) = parse_directive(text).expect("directive");
        assert_eq!(directive.tool_name, "calculator");
        assert_eq!(directive.parameters.get("expression"), Some(&json!("2+2")));
        assert_eq!(clean, "Sure!");
    }

    #[test]
    fn directive_may_span_lines() {
        let text = "I'll check that.\nTOOL_USE: file_manager\nPARAMETERS: {\"action\": \"read\",\n  \"path\": \"notes.txt\"}";
        let (directive, clean) = parse_directive(text).expect("directive");
        assert_eq!(directive.tool_name, "file_manager");
        assert_eq!(directive.parameters.get("path"), Some(&json!("notes.txt")));
        assert_eq!(clean, "I'll check that.");
    }

    #[test]
    fn trailing_prose_survives_the_strip() {
        let text = "Before. TOOL_USE: web_search PARAMETERS: {\"query\": \"x\"} After.";
        let (_, clean) = parse_directive(text).expect("directive");
        assert_eq!(clean, "Before.  After.");
    }

    #[test]
    fn nested_parameter_objects_decode_fully() {
        let text = r#"TOOL_USE: file_manager PARAMETERS: {"action": "write", "meta": {"tags": [1, 2]}} done"#;
        let (directive, clean) = parse_directive(text).expect("directive");
        assert_eq!(directive.parameters.get("meta"), Some(&json!({"tags": [1, 2]})));
        assert_eq!(clean, "done");
    }

    #[test]
    fn malformed_parameters_mean_no_directive() {
        let text = "TOOL_USE: calculator PARAMETERS: {not json}";
        assert!(parse_directive(text).is_none());
    }

    #[test]
    fn non_object_parameters_mean_no_directive() {
        assert!(parse_directive("TOOL_USE: calculator PARAMETERS: x").is_none());
        assert!(parse_directive("TOOL_USE: calculator").is_none());
    }

    #[test]
    fn plain_text_has_no_directive() {
        assert!(parse_directive("The answer is 4.").is_none());
        assert!(parse_directive("").is_none());
    }

    #[test]
    fn incomplete_fragment_is_skipped_for_a_later_complete_one() {
        let text = r#"TOOL_USE: but not really. TOOL_USE: web_search PARAMETERS: {"query": "q"}"#;
        let (directive, _) = parse_directive(text).expect("directive");
        assert_eq!(directive.tool_name, "web_search");
    }

    #[test]
    fn only_the_first_complete_match_is_honored() {
        let text = "TOOL_USE: calculator PARAMETERS: {\"expression\": \"1\"} and TOOL_USE: web_search PARAMETERS: {\"query\": \"q\"}";
        let (directive, clean) = parse_directive(text).expect("directive");
        assert_eq!(directive.tool_name, "calculator");
        // The second fragment is left in the visible text untouched.
        assert!(clean.contains("TOOL_USE: web_search"));
    }
}
