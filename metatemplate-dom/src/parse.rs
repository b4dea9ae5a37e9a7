use crate::{DomError, Element, Node, is_void_element};

/// Minimal hand-rolled HTML reader for canonical templates:
/// - nested elements, void elements and self-closing tags (`<input/>`)
/// - quoted, unquoted and valueless attributes (names lower-cased)
/// - comments and doctype (doctype is dropped)
/// - `<script>`/`<style>` bodies kept as raw text
///
/// Attribute values are kept verbatim, `{{ ... }}` markers included.
pub fn parse_html(input: &str) -> Result<Vec<Node>, DomError> {
    let bytes = input.as_bytes();
    let mut i = 0usize;
    let mut stack: Vec<Element> = Vec::new();
    let mut roots: Vec<Node> = Vec::new();

    fn push_child(stack: &mut [Element], roots: &mut Vec<Node>, node: Node) {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(node);
        } else {
            roots.push(node);
        }
    }

    while i < bytes.len() {
        if bytes[i] != b'<' {
            let start = i;
            while i < bytes.len() && bytes[i] != b'<' {
                i += 1;
            }
            let mut text = input[start..i].to_string();
            if text.chars().all(char::is_whitespace) {
                text = " ".to_string();
            }
            push_child(&mut stack, &mut roots, Node::Text(text));
            continue;
        }

        if input[i..].starts_with("<!--") {
            let body_start = i + 4;
            let end = input[body_start..]
                .find("-->")
                .ok_or(DomError::UnexpectedEof("comment"))?;
            let body = input[body_start..body_start + end].to_string();
            push_child(&mut stack, &mut roots, Node::Comment(body));
            i = body_start + end + 3;
            continue;
        }

        if input[i..].starts_with("<!") {
            let end = input[i..]
                .find('>')
                .ok_or(DomError::UnexpectedEof("doctype"))?;
            i += end + 1;
            continue;
        }

        if i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            let offset = i;
            i += 2;
            let tag = read_ident(bytes, &mut i).to_ascii_lowercase();
            skip_ws(bytes, &mut i);
            if i < bytes.len() && bytes[i] == b'>' {
                i += 1;
            }
            if !stack.iter().any(|e| e.tag == tag) {
                log::debug!("ignoring stray closing tag </{tag}> at byte {offset}");
                continue;
            }
            while let Some(el) = stack.pop() {
                let done = el.tag == tag;
                push_child(&mut stack, &mut roots, Node::Element(el));
                if done {
                    break;
                }
            }
            continue;
        }

        // opening or self-closing tag
        i += 1;
        let tag = read_ident(bytes, &mut i).to_ascii_lowercase();
        if tag.is_empty() {
            push_child(&mut stack, &mut roots, Node::Text("<".to_string()));
            continue;
        }
        let mut el = Element::new(tag);

        loop {
            skip_ws(bytes, &mut i);
            if i >= bytes.len() {
                return Err(DomError::UnexpectedEof("tag"));
            }
            match bytes[i] {
                b'/' => {
                    el.self_closing = true;
                    i += 1;
                    skip_ws(bytes, &mut i);
                    if i < bytes.len() && bytes[i] == b'>' {
                        i += 1;
                    }
                    break;
                }
                b'>' => {
                    i += 1;
                    break;
                }
                _ => {
                    if let Some((name, value)) = read_attribute(input, &mut i)? {
                        if el.get(&name).is_none() {
                            el.put(name, value);
                        }
                    } else {
                        i += 1;
                    }
                }
            }
        }

        if el.self_closing || is_void_element(&el.tag) {
            push_child(&mut stack, &mut roots, Node::Element(el));
        } else if el.tag == "script" || el.tag == "style" {
            let close = format!("</{}", el.tag);
            let end = input[i..]
                .to_ascii_lowercase()
                .find(&close)
                .ok_or(DomError::UnexpectedEof("raw text element"))?;
            let body = &input[i..i + end];
            if !body.is_empty() {
                el.children.push(Node::Text(body.to_string()));
            }
            i += end;
            stack.push(el);
        } else {
            stack.push(el);
        }
    }

    // unclosed tags are closed at end of input
    while let Some(el) = stack.pop() {
        push_child(&mut stack, &mut roots, Node::Element(el));
    }

    roots.retain(|n| !n.is_whitespace());

    Ok(roots)
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn read_ident(bytes: &[u8], i: &mut usize) -> String {
    let start = *i;
    while *i < bytes.len() {
        let c = bytes[*i];
        if c.is_ascii_alphanumeric() || c == b'_' || c == b'-' || c == b':' {
            *i += 1;
        } else {
            break;
        }
    }
    String::from_utf8_lossy(&bytes[start..*i]).into_owned()
}

fn read_attribute(input: &str, i: &mut usize) -> Result<Option<(String, String)>, DomError> {
    let bytes = input.as_bytes();
    let name_start = *i;
    while *i < bytes.len() {
        let c = bytes[*i];
        if c.is_ascii_whitespace() || c == b'=' || c == b'>' || c == b'/' || c == b'"' || c == b'\''
        {
            break;
        }
        *i += 1;
    }
    if *i == name_start {
        return Ok(None);
    }
    let name = input[name_start..*i].to_ascii_lowercase();

    skip_ws(bytes, i);
    if *i >= bytes.len() || bytes[*i] != b'=' {
        return Ok(Some((name, String::new())));
    }
    *i += 1;
    skip_ws(bytes, i);
    if *i >= bytes.len() {
        return Err(DomError::UnexpectedEof("attribute value"));
    }

    let quote = bytes[*i];
    let value = if quote == b'"' || quote == b'\'' {
        *i += 1;
        let start = *i;
        while *i < bytes.len() && bytes[*i] != quote {
            *i += 1;
        }
        if *i >= bytes.len() {
            return Err(DomError::UnexpectedEof("quoted attribute value"));
        }
        let v = input[start..*i].to_string();
        *i += 1;
        v
    } else {
        let start = *i;
        while *i < bytes.len() && !bytes[*i].is_ascii_whitespace() && bytes[*i] != b'>' {
            *i += 1;
        }
        input[start..*i].to_string()
    };

    Ok(Some((name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn element(node: &Node) -> &Element {
        match node {
            Node::Element(e) => e,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn parse_element_with_text() {
        let ast = parse_html("<div>hi</div>").unwrap();
        assert_eq!(ast.len(), 1);
        let div = element(&ast[0]);
        assert_eq!(div.tag, "div");
        assert_eq!(div.children, vec![Node::Text("hi".into())]);
    }

    #[test]
    fn keeps_markers_in_attribute_values() {
        let ast = parse_html(r#"<div class="g-row {{ isReversed?: g-reverse }}"></div>"#).unwrap();
        assert_eq!(
            element(&ast[0]).get("class"),
            Some("g-row {{ isReversed?: g-reverse }}")
        );
    }

    #[test]
    fn void_and_valueless_attributes() {
        let ast = parse_html(r#"<label for="x">L</label><input id="x" disabled>"#).unwrap();
        assert_eq!(ast.len(), 2);
        let input = element(&ast[1]);
        assert_eq!(input.tag, "input");
        assert_eq!(input.get("disabled"), Some(""));
        assert_eq!(input.get("id"), Some("x"));
    }

    #[test]
    fn uppercase_names_are_lowercased() {
        let ast = parse_html(r#"<INPUT TYPE=checkbox>"#).unwrap();
        let input = element(&ast[0]);
        assert_eq!(input.tag, "input");
        assert_eq!(input.get("type"), Some("checkbox"));
    }

    #[test]
    fn stray_close_is_ignored_and_unclosed_is_closed() {
        let ast = parse_html("<p>a</span><b>bold").unwrap();
        let p = element(&ast[0]);
        assert_eq!(p.children.len(), 2);
        assert_eq!(element(&p.children[1]).text_content(), "bold");
    }

    #[test]
    fn comments_and_doctype() {
        let ast = parse_html("<!DOCTYPE html><!-- note --><p>x</p>").unwrap();
        assert_eq!(ast[0], Node::Comment(" note ".into()));
        assert_eq!(element(&ast[1]).tag, "p");
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert!(parse_html(r#"<a href="oops>x</a>"#).is_err());
    }
}
