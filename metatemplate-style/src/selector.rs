//! Just enough selector structure to decide which element a rule styles.
//!
//! Only the subject compound (the part after the last combinator) is broken
//! down; ancestors are recorded as present or not.

use cssparser::{ParseError, Parser, ParserInput, Token};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub classes: Vec<String>,
    pub ids: Vec<String>,
    /// Source text of each pseudo-class or pseudo-element, e.g. `:hover`,
    /// `::before`, `:not(.x)`.
    pub pseudos: Vec<String>,
    /// Source text of each attribute selector, brackets included.
    pub attributes: Vec<String>,
}

impl Compound {
    pub fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.classes.is_empty()
            && self.ids.is_empty()
            && self.pseudos.is_empty()
            && self.attributes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub subject: Compound,
    pub has_ancestors: bool,
    pub text: String,
}

/// Splits `a, b:hover, c d` into its comma-separated selectors. Commas
/// inside functions and attribute brackets do not split.
pub fn split_selector_list(list: &str) -> Vec<String> {
    let mut input = ParserInput::new(list);
    let mut parser = Parser::new(&mut input);
    match parser.parse_comma_separated(rest_of_item) {
        Ok(items) => items.into_iter().filter(|s| !s.is_empty()).collect(),
        Err(_) => vec![list.trim().to_string()],
    }
}

fn rest_of_item<'i>(p: &mut Parser<'i, '_>) -> Result<String, ParseError<'i, ()>> {
    let start = p.position();
    while p.next().is_ok() {}
    Ok(p.slice_from(start).trim().to_string())
}

fn skip_block<'i>(p: &mut Parser<'i, '_>) {
    let consumed: Result<(), ParseError<'i, ()>> = p.parse_nested_block(|nested| {
        while nested.next().is_ok() {}
        Ok(())
    });
    if consumed.is_err() {
        log::trace!("unbalanced block in selector");
    }
}

pub fn parse_selector(text: &str) -> ComplexSelector {
    let mut input = ParserInput::new(text);
    let mut p = Parser::new(&mut input);

    let mut subject = Compound::default();
    let mut has_ancestors = false;
    let mut after_combinator = false;

    loop {
        let start = p.position();
        let token = match p.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::WhiteSpace(_) => {
                if !subject.is_empty() {
                    after_combinator = true;
                }
                continue;
            }
            Token::Delim('>' | '+' | '~') => {
                after_combinator = true;
                continue;
            }
            _ => {}
        }

        if after_combinator {
            has_ancestors = true;
            subject = Compound::default();
            after_combinator = false;
        }

        match token {
            Token::Ident(name) => subject.tag = Some(name.to_ascii_lowercase()),
            Token::Delim('*') => subject.tag = Some("*".to_string()),
            Token::Delim('.') => {
                if let Ok(Token::Ident(class)) = p.next_including_whitespace() {
                    subject.classes.push(class.to_string());
                }
            }
            Token::IDHash(id) | Token::Hash(id) => subject.ids.push(id.to_string()),
            Token::Colon => {
                loop {
                    match p.next_including_whitespace().cloned() {
                        Ok(Token::Colon) => continue,
                        Ok(Token::Function(_)) => {
                            skip_block(&mut p);
                            break;
                        }
                        _ => break,
                    }
                }
                subject.pseudos.push(p.slice_from(start).to_string());
            }
            Token::SquareBracketBlock => {
                skip_block(&mut p);
                subject.attributes.push(p.slice_from(start).to_string());
            }
            other => log::trace!("ignoring selector token {other:?} in `{text}`"),
        }
    }

    ComplexSelector {
        subject,
        has_ancestors,
        text: text.trim().to_string(),
    }
}
