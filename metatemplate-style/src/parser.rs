use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, StyleSheetParser,
};

use crate::{CssNode, StyleError};

/// Top-level rules are strict: a broken rule fails the whole sheet. Broken
/// declarations inside a rule body are dropped with a warning.
pub(crate) fn parse_nodes(css: &str) -> Result<Vec<CssNode>, StyleError> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut tree = TreeParser;

    let mut nodes = Vec::new();
    for result in StyleSheetParser::new(&mut parser, &mut tree) {
        match result {
            Ok(node) => nodes.push(node),
            Err((e, snippet)) => {
                return Err(StyleError::Syntax {
                    line: e.location.line + 1,
                    message: format!("{:?}", e.kind),
                    snippet: snippet.trim().to_string(),
                });
            }
        }
    }
    Ok(nodes)
}

fn rest_as_text<'i>(input: &mut Parser<'i, '_>) -> String {
    let start = input.position();
    while input.next().is_ok() {}
    input.slice_from(start).trim().to_string()
}

fn parse_body<'i>(input: &mut Parser<'i, '_>) -> Vec<CssNode> {
    let mut body = BodyParser;
    let mut nodes = Vec::new();
    for result in RuleBodyParser::new(input, &mut body) {
        match result {
            Ok(node) => nodes.push(node),
            Err((e, snippet)) => {
                log::warn!(
                    "skipping unparseable CSS at line {}: `{}`",
                    e.location.line + 1,
                    snippet.trim()
                );
            }
        }
    }
    nodes
}

struct TreeParser;

impl<'i> QualifiedRuleParser<'i> for TreeParser {
    type Prelude = String;
    type QualifiedRule = CssNode;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let selector = rest_as_text(input);
        if selector.is_empty() {
            return Err(input.new_custom_error::<(), ()>(()));
        }
        Ok(selector)
    }

    fn parse_block<'t>(
        &mut self,
        selector: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        Ok(CssNode::Rule {
            selector,
            nodes: parse_body(input),
        })
    }
}

impl<'i> AtRuleParser<'i> for TreeParser {
    type Prelude = (String, String);
    type AtRule = CssNode;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Ok((name.to_string(), rest_as_text(input)))
    }

    fn rule_without_block(
        &mut self,
        (name, params): Self::Prelude,
        _start: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        Ok(CssNode::AtRule {
            name,
            params,
            nodes: Vec::new(),
        })
    }

    fn parse_block<'t>(
        &mut self,
        (name, params): Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        Ok(CssNode::AtRule {
            name,
            params,
            nodes: parse_body(input),
        })
    }
}

/// Rule bodies: declarations, nested rules and nested at-rules.
struct BodyParser;

impl<'i> DeclarationParser<'i> for BodyParser {
    type Declaration = CssNode;
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let value = rest_as_text(input);
        if value.is_empty() {
            return Err(input.new_custom_error::<(), ()>(()));
        }
        Ok(CssNode::Decl {
            prop: name.to_string(),
            value,
        })
    }
}

impl<'i> QualifiedRuleParser<'i> for BodyParser {
    type Prelude = String;
    type QualifiedRule = CssNode;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        QualifiedRuleParser::parse_prelude(&mut TreeParser, input)
    }

    fn parse_block<'t>(
        &mut self,
        selector: Self::Prelude,
        start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        QualifiedRuleParser::parse_block(&mut TreeParser, selector, start, input)
    }
}

impl<'i> AtRuleParser<'i> for BodyParser {
    type Prelude = (String, String);
    type AtRule = CssNode;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        AtRuleParser::parse_prelude(&mut TreeParser, name, input)
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        start: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        TreeParser.rule_without_block(prelude, start)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        AtRuleParser::parse_block(&mut TreeParser, prelude, start, input)
    }
}

impl<'i> RuleBodyItemParser<'i, CssNode, ()> for BodyParser {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        true
    }
}
