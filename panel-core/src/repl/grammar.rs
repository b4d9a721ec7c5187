#![allow(clippy::module_name_repetitions)]

//! Lexer and parser for the panel command language.
//!
//! The lexer uses `regal` to produce a bounded token stream, while the parser
//! walks the [`catalog`](super::catalog) grammar with `winnow` combinators over
//! those tokens to build structured command values.

use super::catalog::{self, ChoiceBranch, ChoiceTag, CommandTag, Node};
use crate::behavior::{ButtonId, Signal};
use core::fmt;
use core::ops::Range;
use core::time::Duration;

use heapless::Vec as HeaplessVec;
use regal::IncrementalError;
use regal::TokenCache;
use regal_macros::RegalLexer;
#[allow(deprecated)]
use winnow::error::ErrorKind;
use winnow::error::{ErrMode, ParserError};
use winnow::prelude::*;
use winnow::stream::Stream;

/// Maximum number of tokens produced per command line.
pub const MAX_TOKENS: usize = 32;
const MAX_CACHE_RECORDS: usize = MAX_TOKENS * 2;

/// Lexical token kinds recognized by the command grammar.
#[derive(RegalLexer, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TokenKind {
    /// Duration literal ending in `ms` or `s`.
    #[regex(r"[0-9]+(?:ms|s)", priority = 2)]
    Duration,
    /// Unsuffixed integer literal.
    #[regex(r"[0-9]+")]
    Integer,
    /// Identifier or keyword (case-insensitive match performed later).
    #[regex(r"[A-Za-z][A-Za-z0-9_-]*")]
    Ident,
    /// Double-quoted text on a single line.
    #[regex(r#""[^"\r\n]*""#)]
    Text,
    /// Inline whitespace is ignored.
    #[regex(r"[ \t]+", skip)]
    Whitespace,
    /// End-of-line token (`\r`, `\n`, or `\r\n`).
    #[token("\r\n")]
    #[token("\n")]
    #[token("\r")]
    Eol,
    /// Pseudo variant used when the lexer encounters unsupported input.
    #[default]
    #[regex(r".", priority = 1024)]
    Error,
}

/// Token emitted by the lexer with a byte span back into the source line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub span: Range<usize>,
}

/// Bounded token buffer.
pub type TokenBuffer<'a> = HeaplessVec<Token<'a>, MAX_TOKENS>;

/// Lexer errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LexError {
    /// Input produced more tokens than the static buffer allows.
    TooManyTokens { processed: usize },
    /// Underlying lexer reported an unrecoverable error.
    Engine,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::TooManyTokens { processed } => {
                write!(f, "token buffer exhausted after {processed} items")
            }
            LexError::Engine => write!(f, "lexer engine error"),
        }
    }
}

/// Grammar errors emitted by the parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GrammarErrorKind<'a> {
    UnexpectedToken {
        expected: &'static str,
        found: Option<TokenKind>,
        span: Range<usize>,
    },
    UnexpectedEnd {
        expected: &'static str,
    },
    InvalidButton {
        span: Range<usize>,
    },
    InvalidDuration {
        span: Range<usize>,
    },
    InvalidToken {
        span: Range<usize>,
        lexeme: &'a str,
    },
}

impl fmt::Display for GrammarErrorKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarErrorKind::UnexpectedToken {
                expected,
                found,
                span,
            } => write!(f, "expected {expected}, found {found:?} at {span:?}"),
            GrammarErrorKind::UnexpectedEnd { expected } => {
                write!(f, "unexpected end of input, expected {expected}")
            }
            GrammarErrorKind::InvalidButton { span } => {
                write!(f, "invalid button id at {span:?}")
            }
            GrammarErrorKind::InvalidDuration { span } => {
                write!(f, "invalid duration literal at {span:?}")
            }
            GrammarErrorKind::InvalidToken { span, lexeme } => {
                write!(f, "unsupported token `{lexeme}` at {span:?}")
            }
        }
    }
}

/// Wrapper type enabling a consistent error surface for consumers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrammarError<'a> {
    pub kind: GrammarErrorKind<'a>,
}

impl fmt::Display for GrammarError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl<'a> GrammarError<'a> {
    fn unexpected(expected: &'static str, token: Option<&Token<'a>>) -> Self {
        GrammarError {
            kind: match token {
                Some(tok) if tok.kind != TokenKind::Eol => GrammarErrorKind::UnexpectedToken {
                    expected,
                    found: Some(tok.kind),
                    span: tok.span.clone(),
                },
                _ => GrammarErrorKind::UnexpectedEnd { expected },
            },
        }
    }

    fn invalid_button(token: &Token<'a>) -> Self {
        GrammarError {
            kind: GrammarErrorKind::InvalidButton {
                span: token.span.clone(),
            },
        }
    }

    fn invalid_duration(token: &Token<'a>) -> Self {
        GrammarError {
            kind: GrammarErrorKind::InvalidDuration {
                span: token.span.clone(),
            },
        }
    }

    fn invalid_token(token: &Token<'a>) -> Self {
        GrammarError {
            kind: GrammarErrorKind::InvalidToken {
                span: token.span.clone(),
                lexeme: token.lexeme,
            },
        }
    }
}

type Input<'src, 'slice> = &'slice [Token<'src>];

#[allow(deprecated)]
impl<'src, 'slice> ParserError<Input<'src, 'slice>> for GrammarError<'src>
where
    'src: 'slice,
{
    fn from_error_kind(input: &Input<'src, 'slice>, _kind: ErrorKind) -> Self {
        GrammarError::unexpected("token", input.first())
    }

    fn append(
        self,
        _input: &Input<'src, 'slice>,
        _token_start: &<Input<'src, 'slice> as Stream>::Checkpoint,
        _kind: ErrorKind,
    ) -> Self {
        self
    }

    fn or(self, other: Self) -> Self {
        other
    }
}

/// Combined lex/parse error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError<'a> {
    Lex(LexError),
    Grammar(GrammarError<'a>),
}

impl fmt::Display for ParseError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Lex(err) => err.fmt(f),
            ParseError::Grammar(err) => err.fmt(f),
        }
    }
}

/// Structured commands produced by the parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Press(ButtonId),
    Hold(ButtonId),
    Release(ButtonId),
    Input { button: ButtonId, text: &'a str },
    Wait(Duration),
    Signal { signal: Signal, enabled: bool },
    Duplicate(ButtonId),
    Remove(ButtonId),
    Status(Option<ButtonId>),
    Log,
    Help { topic: Option<&'a str> },
}

fn parse_tokens_partial<'src, 'slice>(
    tokens: &'slice [Token<'src>],
) -> Result<(Command<'src>, &'slice [Token<'src>]), GrammarError<'src>>
where
    'src: 'slice,
{
    let mut input = tokens;
    match command().parse_next(&mut input) {
        Ok(cmd) => Ok((cmd, input)),
        Err(ErrMode::Backtrack(err) | ErrMode::Cut(err)) => Err(err),
        Err(ErrMode::Incomplete(_)) => Err(GrammarError::unexpected("token", input.first())),
    }
}

/// Tokenize the provided line.
pub fn lex(line: &str) -> Result<TokenBuffer<'_>, LexError> {
    let compiled = TokenKind::lexer();
    let mut cache: TokenCache<TokenKind, MAX_CACHE_RECORDS> = TokenCache::new();
    let partial = cache
        .rebuild(compiled, line)
        .map_err(map_incremental_error)?;
    let mut buffer = TokenBuffer::new();

    for record in cache.tokens() {
        if record.skipped {
            continue;
        }

        let span = record.start..record.end;
        let lexeme = &line[span.clone()];
        push_token(&mut buffer, record.token, lexeme, span)?;
    }

    if let Some(partial) = partial.filter(|partial| !partial.fragment.is_empty()) {
        let start = partial.start;
        let span = start..start + partial.fragment.len();
        push_token(&mut buffer, TokenKind::Error, partial.fragment, span)?;
    }

    Ok(buffer)
}

fn push_token<'a>(
    buffer: &mut TokenBuffer<'a>,
    kind: TokenKind,
    lexeme: &'a str,
    span: Range<usize>,
) -> Result<(), LexError> {
    buffer
        .push(Token { kind, lexeme, span })
        .map_err(|_| LexError::TooManyTokens {
            processed: buffer.len() + 1,
        })
}

fn map_incremental_error(error: IncrementalError) -> LexError {
    match error {
        IncrementalError::TokenOverflow => LexError::TooManyTokens {
            processed: MAX_TOKENS,
        },
        _ => LexError::Engine,
    }
}

/// Parse a command from the provided line.
pub fn parse(line: &str) -> Result<Command<'_>, ParseError<'_>> {
    let tokens = lex(line).map_err(ParseError::Lex)?;

    if let Some(token) = tokens.iter().find(|token| token.kind == TokenKind::Error) {
        return Err(ParseError::Grammar(GrammarError::invalid_token(token)));
    }

    let (command, mut rest) =
        parse_tokens_partial(tokens.as_slice()).map_err(ParseError::Grammar)?;

    while let Some((token, remaining)) = rest.split_first() {
        if token.kind == TokenKind::Eol {
            rest = remaining;
        } else {
            return Err(ParseError::Grammar(GrammarError::unexpected(
                "end of command",
                Some(token),
            )));
        }
    }

    Ok(command)
}

fn command<'src, 'slice>() -> impl Parser<Input<'src, 'slice>, Command<'src>, GrammarError<'src>>
where
    'src: 'slice,
{
    move |input: &mut Input<'src, 'slice>| {
        let snapshot = *input;
        let command_token = expect_kind(TokenKind::Ident, "command keyword").parse_next(input)?;

        if let Some(spec) = catalog::find(command_token.lexeme) {
            let mut state = CommandState::default();
            parse_node(spec.grammar, input, &mut state)?;
            state.finish(spec.tag)
        } else {
            *input = snapshot;
            Err(ErrMode::Backtrack(GrammarError::unexpected(
                "command keyword",
                Some(&command_token),
            )))
        }
    }
}

fn parse_node<'src, 'slice>(
    node: &'static Node,
    input: &mut Input<'src, 'slice>,
    state: &mut CommandState<'src>,
) -> Result<(), ErrMode<GrammarError<'src>>>
where
    'src: 'slice,
{
    match node {
        Node::End => Ok(()),
        Node::Button { optional, next } => {
            match input.first() {
                Some(token) if token.kind == TokenKind::Integer => {
                    let token = expect_kind(TokenKind::Integer, "button id").parse_next(input)?;
                    state.button = Some(parse_button(&token).map_err(ErrMode::Cut)?);
                }
                Some(token) if *optional && token.kind == TokenKind::Eol => {}
                None if *optional => {}
                other => {
                    return Err(ErrMode::Backtrack(GrammarError::unexpected(
                        "button id",
                        other,
                    )));
                }
            }
            parse_node(next, input, state)
        }
        Node::Duration { next } => {
            let token = expect_kind(TokenKind::Duration, "duration").parse_next(input)?;
            state.duration = Some(parse_duration(&token).map_err(ErrMode::Cut)?);
            parse_node(next, input, state)
        }
        Node::Text { next } => {
            state.text = Some(parse_text(input)?);
            parse_node(next, input, state)
        }
        Node::Choice {
            label,
            choices,
            next,
        } => {
            let token = expect_kind(TokenKind::Ident, *label).parse_next(input)?;
            let branch = find_choice(choices, token.lexeme).ok_or_else(|| {
                ErrMode::Cut(GrammarError::unexpected(*label, Some(&token)))
            })?;
            state.apply_choice(branch.tag);
            parse_node(next, input, state)
        }
        Node::Topic { next } => {
            if let Some((token, rest)) = input.split_first() {
                if token.kind == TokenKind::Ident {
                    state.text = Some(token.lexeme);
                    *input = rest;
                }
            }
            parse_node(next, input, state)
        }
    }
}

fn parse_text<'src, 'slice>(
    input: &mut Input<'src, 'slice>,
) -> Result<&'src str, ErrMode<GrammarError<'src>>>
where
    'src: 'slice,
{
    match input.split_first() {
        Some((token, rest)) if token.kind == TokenKind::Text => {
            *input = rest;
            let lexeme = token.lexeme;
            Ok(lexeme
                .strip_prefix('"')
                .and_then(|inner| inner.strip_suffix('"'))
                .unwrap_or(lexeme))
        }
        Some((token, rest)) if matches!(token.kind, TokenKind::Ident | TokenKind::Integer) => {
            *input = rest;
            Ok(token.lexeme)
        }
        other => Err(ErrMode::Backtrack(GrammarError::unexpected(
            "quoted text",
            other.map(|(token, _)| token),
        ))),
    }
}

fn find_choice(choices: &'static [ChoiceBranch], lexeme: &str) -> Option<&'static ChoiceBranch> {
    choices
        .iter()
        .find(|choice| choice.keyword.eq_ignore_ascii_case(lexeme))
}

#[derive(Default)]
struct CommandState<'a> {
    button: Option<ButtonId>,
    duration: Option<Duration>,
    text: Option<&'a str>,
    signal: Option<Signal>,
    enabled: Option<bool>,
}

impl<'a> CommandState<'a> {
    fn apply_choice(&mut self, tag: ChoiceTag) {
        match tag {
            ChoiceTag::SignalLimit => self.signal = Some(Signal::LimitReached),
            ChoiceTag::SignalCompleted => self.signal = Some(Signal::TaskCompleted),
            ChoiceTag::SignalIncomplete => self.signal = Some(Signal::TasksIncomplete),
            ChoiceTag::On => self.enabled = Some(true),
            ChoiceTag::Off => self.enabled = Some(false),
        }
    }

    fn finish(self, tag: CommandTag) -> Result<Command<'a>, ErrMode<GrammarError<'a>>> {
        let missing = |expected| ErrMode::Backtrack(GrammarError::unexpected(expected, None));
        let button = || self.button.ok_or_else(|| missing("button id"));

        Ok(match tag {
            CommandTag::Press => Command::Press(button()?),
            CommandTag::Hold => Command::Hold(button()?),
            CommandTag::Release => Command::Release(button()?),
            CommandTag::Duplicate => Command::Duplicate(button()?),
            CommandTag::Remove => Command::Remove(button()?),
            CommandTag::Input => Command::Input {
                button: button()?,
                text: self.text.ok_or_else(|| missing("quoted text"))?,
            },
            CommandTag::Wait => Command::Wait(self.duration.ok_or_else(|| missing("duration"))?),
            CommandTag::Signal => Command::Signal {
                signal: self.signal.ok_or_else(|| missing("signal name"))?,
                enabled: self.enabled.ok_or_else(|| missing("on|off"))?,
            },
            CommandTag::Status => Command::Status(self.button),
            CommandTag::Log => Command::Log,
            CommandTag::Help => Command::Help { topic: self.text },
        })
    }
}

fn expect_kind<'src, 'slice>(
    kind: TokenKind,
    label: &'static str,
) -> impl Parser<Input<'src, 'slice>, Token<'src>, GrammarError<'src>>
where
    'src: 'slice,
{
    move |input: &mut Input<'src, 'slice>| match input.split_first() {
        Some((token, rest)) if token.kind == kind => {
            *input = rest;
            Ok(token.clone())
        }
        Some((token, _)) => Err(ErrMode::Backtrack(GrammarError::unexpected(
            label,
            Some(token),
        ))),
        None => Err(ErrMode::Backtrack(GrammarError::unexpected(label, None))),
    }
}

fn parse_button<'a>(token: &Token<'a>) -> Result<ButtonId, GrammarError<'a>> {
    token
        .lexeme
        .parse::<u32>()
        .map(ButtonId)
        .map_err(|_| GrammarError::invalid_button(token))
}

fn parse_duration<'a>(token: &Token<'a>) -> Result<Duration, GrammarError<'a>> {
    let text = token.lexeme;
    if let Some(rest) = text.strip_suffix("ms") {
        let millis = rest
            .parse::<u32>()
            .map_err(|_| GrammarError::invalid_duration(token))?;
        Ok(Duration::from_millis(millis.into()))
    } else if let Some(rest) = text.strip_suffix('s') {
        let seconds = rest
            .parse::<u32>()
            .map_err(|_| GrammarError::invalid_duration(token))?;
        Ok(Duration::from_secs(seconds.into()))
    } else {
        Err(GrammarError::invalid_duration(token))
    }
}
