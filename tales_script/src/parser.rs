//! Recursive-descent parser from token lines to a [`Program`].
//!
//! Every script is a sequence of `@scene` headers, each followed by dialogue,
//! choice and `@if` lines up to the next header. `@if` blocks nest; `@scene`
//! may not appear inside one.

use crate::ast::{Choice, Dialogue, Element, ElementId, IfBlock, Program, Scene};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Token, TokenKind, TokenLines};
use log::debug;
use std::collections::HashMap;

/// Build a [`Program`] from tokenized lines.
///
/// # Errors
/// Returns the first structural violation found, tagged with its source line.
pub fn parse_tokens(lines: &TokenLines) -> Result<Program, ParseError> {
    let mut parser = Parser {
        lines: lines.iter().map(|(line, tokens)| (*line, tokens.as_slice())).collect(),
        pos: 0,
        program: Program::new(),
        scene_lines: HashMap::new(),
    };
    parser.parse_scenes()?;
    let mut program = parser.program;
    program.link_parents();
    debug!(
        "parsed {} scene(s), {} element(s)",
        program.scene_ids().len(),
        program.len()
    );
    Ok(program)
}

/// Concatenate token texts with no separator.
fn join_tokens(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

/// Collect the contents of a `{ ... }` block starting at `open`.
///
/// Nested braces are kept verbatim in the returned text. The returned index
/// points just past the matching close bracket.
fn bracket_content(tokens: &[Token], open: usize) -> Result<(String, usize), ParseErrorKind> {
    let mut depth = 0usize;
    let mut content = String::new();
    for (idx, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::OpenBracket => {
                if depth > 0 {
                    content.push('{');
                }
                depth += 1;
            },
            TokenKind::CloseBracket => {
                depth -= 1;
                if depth == 0 {
                    return Ok((content.trim().to_string(), idx + 1));
                }
                content.push('}');
            },
            _ => content.push_str(&token.text),
        }
    }
    Err(ParseErrorKind::UnbalancedBrackets)
}

/// Read a run of `{...}` blocks; anything else is reported through `stray`.
fn effect_blocks(
    tokens: &[Token],
    mut idx: usize,
    stray: impl Fn(&Token) -> ParseErrorKind,
) -> Result<Vec<String>, ParseErrorKind> {
    let mut effects = Vec::new();
    while let Some(token) = tokens.get(idx) {
        if token.kind != TokenKind::OpenBracket {
            return Err(stray(token));
        }
        let (content, next) = bracket_content(tokens, idx)?;
        effects.push(content);
        idx = next;
    }
    Ok(effects)
}

struct Parser<'a> {
    lines: Vec<(usize, &'a [Token])>,
    pos: usize,
    program: Program,
    scene_lines: HashMap<String, usize>,
}

/// Where a body is being parsed; decides how `@scene`/`@else`/`@endif` are treated.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Context {
    Scene,
    Block,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<(usize, &'a [Token])> {
        self.lines.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<(usize, &'a [Token])> {
        let next = self.peek();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn parse_scenes(&mut self) -> Result<(), ParseError> {
        while let Some((line, tokens)) = self.advance() {
            let name = self.scene_header(line, tokens)?;
            if let Some(first) = self.scene_lines.get(&name) {
                return Err(ParseError::new(
                    line,
                    ParseErrorKind::DuplicateScene { name, first: *first },
                ));
            }
            self.scene_lines.insert(name.clone(), line);
            let scene_id = self.program.alloc(Element::Scene(Scene {
                name,
                content: Vec::new(),
                line,
            }));
            let content = self.parse_scene_body()?;
            if let Some(Element::Scene(scene)) = self.program.get_mut(scene_id) {
                scene.content = content;
            }
        }
        Ok(())
    }

    fn scene_header(&self, line: usize, tokens: &[Token]) -> Result<String, ParseError> {
        let Some(first) = tokens.first() else {
            return Err(ParseError::new(line, ParseErrorKind::MissingSceneName));
        };
        if first.kind != TokenKind::Scene {
            return Err(ParseError::new(
                line,
                ParseErrorKind::ExpectedScene {
                    found: first.text.clone(),
                },
            ));
        }
        let name = match tokens.get(1) {
            Some(token) if token.is_word() => token.text.clone(),
            _ => return Err(ParseError::new(line, ParseErrorKind::MissingSceneName)),
        };
        if let Some(extra) = tokens.get(2) {
            return Err(ParseError::new(
                line,
                ParseErrorKind::TrailingAfterSceneName {
                    scene: name,
                    found: extra.text.clone(),
                },
            ));
        }
        Ok(name)
    }

    /// Parse elements until the next `@scene` header or end of input.
    fn parse_scene_body(&mut self) -> Result<Vec<ElementId>, ParseError> {
        let mut content = Vec::new();
        while let Some((line, tokens)) = self.peek() {
            if tokens[0].kind == TokenKind::Scene {
                break;
            }
            self.pos += 1;
            content.push(self.parse_statement(line, tokens, Context::Scene)?);
        }
        Ok(content)
    }

    fn parse_statement(&mut self, line: usize, tokens: &[Token], context: Context) -> Result<ElementId, ParseError> {
        let element = match tokens[0].kind {
            TokenKind::Dialogue => parse_dialogue(line, tokens).map_err(|kind| ParseError::new(line, kind))?,
            TokenKind::Choice { level } => {
                parse_choice(line, level, tokens).map_err(|kind| ParseError::new(line, kind))?
            },
            TokenKind::If => return self.parse_if(line, tokens),
            TokenKind::Scene if context == Context::Block => {
                return Err(ParseError::new(line, ParseErrorKind::SceneInsideIf));
            },
            TokenKind::Else | TokenKind::EndIf => {
                return Err(ParseError::new(
                    line,
                    ParseErrorKind::StrayDirective {
                        directive: tokens[0].text.clone(),
                    },
                ));
            },
            _ => {
                return Err(ParseError::new(
                    line,
                    ParseErrorKind::ExpectedScene {
                        found: tokens[0].text.clone(),
                    },
                ));
            },
        };
        Ok(self.program.alloc(element))
    }

    fn parse_if(&mut self, line: usize, tokens: &[Token]) -> Result<ElementId, ParseError> {
        let condition = join_tokens(&tokens[1..]).trim().to_string();
        if condition.is_empty() {
            return Err(ParseError::new(line, ParseErrorKind::MissingCondition));
        }
        let block_id = self.program.alloc(Element::If(IfBlock {
            condition,
            then_branch: Vec::new(),
            else_branch: None,
            line,
        }));

        let mut then_branch = Vec::new();
        let mut else_branch: Option<Vec<ElementId>> = None;
        loop {
            let Some((inner_line, inner)) = self.advance() else {
                return Err(ParseError::new(line, ParseErrorKind::UnterminatedIf { opened: line }));
            };
            match inner[0].kind {
                TokenKind::Else => {
                    reject_trailing(inner_line, inner)?;
                    if else_branch.is_some() {
                        return Err(ParseError::new(inner_line, ParseErrorKind::DuplicateElse));
                    }
                    else_branch = Some(Vec::new());
                },
                TokenKind::EndIf => {
                    reject_trailing(inner_line, inner)?;
                    break;
                },
                _ => {
                    let child = self.parse_statement(inner_line, inner, Context::Block)?;
                    match else_branch.as_mut() {
                        Some(branch) => branch.push(child),
                        None => then_branch.push(child),
                    }
                },
            }
        }

        if let Some(Element::If(block)) = self.program.get_mut(block_id) {
            block.then_branch = then_branch;
            block.else_branch = else_branch;
        }
        Ok(block_id)
    }
}

fn reject_trailing(line: usize, tokens: &[Token]) -> Result<(), ParseError> {
    match tokens.get(1) {
        Some(extra) => Err(ParseError::new(
            line,
            ParseErrorKind::TrailingAfterDirective {
                directive: tokens[0].text.clone(),
                found: extra.text.clone(),
            },
        )),
        None => Ok(()),
    }
}

/// `> Speaker: text {effect}...`
fn parse_dialogue(line: usize, tokens: &[Token]) -> Result<Element, ParseErrorKind> {
    let (Some(speaker), Some(sep), Some(text)) = (tokens.get(1), tokens.get(2), tokens.get(3)) else {
        return Err(ParseErrorKind::MalformedDialogue);
    };
    if !speaker.is_word() || sep.kind != TokenKind::Separator || !text.is_word() {
        return Err(ParseErrorKind::MalformedDialogue);
    }
    let effects = effect_blocks(tokens, 4, |stray| ParseErrorKind::TrailingAfterDialogue {
        found: stray.text.clone(),
    })?;
    Ok(Element::Dialogue(Dialogue {
        speaker: speaker.text.clone(),
        text: text.text.clone(),
        effects,
        line,
    }))
}

/// `*... text {condition} {effect}... -> destination`
///
/// The first bracket is the condition, later ones are effects. The transition
/// may sit anywhere after the text but only once.
fn parse_choice(line: usize, level: usize, tokens: &[Token]) -> Result<Element, ParseErrorKind> {
    let text = match tokens.get(1) {
        Some(token) if token.is_word() => token.text.clone(),
        _ => {
            return Err(ParseErrorKind::MissingChoiceText {
                marker: tokens[0].text.clone(),
            });
        },
    };

    let mut condition = None;
    let mut effects = Vec::new();
    let mut transition = None;
    let mut seen_bracket = false;
    let mut idx = 2;
    while let Some(token) = tokens.get(idx) {
        match token.kind {
            TokenKind::OpenBracket => {
                let (content, next) = bracket_content(tokens, idx)?;
                if seen_bracket {
                    effects.push(content);
                } else {
                    condition = Some(content);
                    seen_bracket = true;
                }
                idx = next;
            },
            TokenKind::Transition => {
                if transition.is_some() {
                    return Err(ParseErrorKind::DuplicateTransition);
                }
                match tokens.get(idx + 1) {
                    Some(dest) if dest.is_word() => transition = Some(dest.text.clone()),
                    _ => return Err(ParseErrorKind::MissingDestination),
                }
                idx += 2;
            },
            _ => {
                return Err(ParseErrorKind::UnexpectedInChoice {
                    found: token.text.clone(),
                });
            },
        }
    }

    Ok(Element::Choice(Choice {
        level,
        text,
        condition,
        effects,
        transition,
        line,
    }))
}
