//! Tokenizer (spec.md §6).

use chumsky::prelude::*;
use chumsky::text::{ascii, whitespace};

pub type Span = SimpleSpan<usize>;

#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    Ident(&'src str),
    Int(i64),
    Float(f64),
    Str(&'src str),
    // Keywords
    Agent,
    Const,
    Param,
    Environment,
    Function,
    Step,
    Seq,
    Main,
    Simulate,
    If,
    Else,
    While,
    For,
    Return,
    Break,
    Continue,
    New,
    Out,
    Position,
    Bool,
    Int_,
    Float_,
    StringKw,
    Float2,
    Float3,
    True,
    False,
    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Dot,
    DotDot,
    Colon,
    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,
    Eq,
    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    Question,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
}

pub fn lexer<'src>() -> impl Parser<'src, &'src str, Vec<(Token<'src>, Span)>, extra::Err<Rich<'src, char, Span>>> {
    let num = text::int(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .map(|s: &str| {
            if s.contains('.') {
                Token::Float(s.parse().unwrap())
            } else {
                Token::Int(s.parse().unwrap())
            }
        });

    let string = just('"')
        .ignore_then(none_of('"').repeated().to_slice())
        .then_ignore(just('"'))
        .map(Token::Str);

    let ident = ascii::ident().map(|s: &str| match s {
        "agent" => Token::Agent,
        "const" => Token::Const,
        "param" => Token::Param,
        "environment" => Token::Environment,
        "function" => Token::Function,
        "step" => Token::Step,
        "seq" => Token::Seq,
        "main" => Token::Main,
        "simulate" => Token::Simulate,
        "if" => Token::If,
        "else" => Token::Else,
        "while" => Token::While,
        "for" => Token::For,
        "return" => Token::Return,
        "break" => Token::Break,
        "continue" => Token::Continue,
        "new" => Token::New,
        "out" => Token::Out,
        "position" => Token::Position,
        "bool" => Token::Bool,
        "int" => Token::Int_,
        "float" => Token::Float_,
        "string" => Token::StringKw,
        "float2" => Token::Float2,
        "float3" => Token::Float3,
        "true" => Token::True,
        "false" => Token::False,
        _ => Token::Ident(s),
    });

    let op = choice((
        just("<<").to(Token::Shl),
        just(">>").to(Token::Shr),
        just("==").to(Token::EqEq),
        just("!=").to(Token::Ne),
        just("<=").to(Token::Le),
        just(">=").to(Token::Ge),
        just("&&").to(Token::AndAnd),
        just("||").to(Token::OrOr),
        just("+=").to(Token::PlusEq),
        just("-=").to(Token::MinusEq),
        just("*=").to(Token::StarEq),
        just("/=").to(Token::SlashEq),
        just("..").to(Token::DotDot),
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just('%').to(Token::Percent),
        just('&').to(Token::Amp),
        just('|').to(Token::Pipe),
        just('^').to(Token::Caret),
        just('~').to(Token::Tilde),
        just('=').to(Token::Eq),
        just('<').to(Token::Lt),
        just('>').to(Token::Gt),
        just('!').to(Token::Bang),
        just('?').to(Token::Question),
    ));

    let punct = choice((
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('{').to(Token::LBrace),
        just('}').to(Token::RBrace),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
        just(',').to(Token::Comma),
        just(';').to(Token::Semi),
        just(':').to(Token::Colon),
        just('.').to(Token::Dot),
    ));

    let line_comment = just("//").then(none_of('\n').repeated()).padded();
    let block_comment = just("/*").then(any().and_is(just("*/").not()).repeated()).then(just("*/")).padded();

    let token = num.or(string).or(ident).or(op).or(punct);

    token
        .map_with(|tok, e| (tok, e.span()))
        .padded_by(line_comment.or(block_comment).repeated())
        .padded_by(whitespace())
        .repeated()
        .collect()
}
