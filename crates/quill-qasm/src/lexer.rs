//! Lexer for `OpenQASM` 2.

use logos::Logos;

/// Tokens for `OpenQASM` 2.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // Keywords
    #[token("OPENQASM")]
    OpenQasm,

    #[token("include")]
    Include,

    #[token("qreg")]
    QReg,

    #[token("creg")]
    CReg,

    #[token("gate")]
    Gate,

    #[token("opaque")]
    Opaque,

    #[token("measure")]
    Measure,

    #[token("reset")]
    Reset,

    #[token("barrier")]
    Barrier,

    #[token("if")]
    If,

    #[token("inv")]
    Inv,

    // Constants
    #[token("pi")]
    Pi,

    // Literals
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    IntLiteral(u64),

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        Some(s[1..s.len()-1].to_string())
    })]
    StringLiteral(String),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators and punctuation
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("^")]
    Caret,

    #[token("==")]
    EqEq,

    #[token("->")]
    Arrow,

    #[token("@")]
    At,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::OpenQasm => write!(f, "OPENQASM"),
            Token::Include => write!(f, "include"),
            Token::QReg => write!(f, "qreg"),
            Token::CReg => write!(f, "creg"),
            Token::Gate => write!(f, "gate"),
            Token::Opaque => write!(f, "opaque"),
            Token::Measure => write!(f, "measure"),
            Token::Reset => write!(f, "reset"),
            Token::Barrier => write!(f, "barrier"),
            Token::If => write!(f, "if"),
            Token::Inv => write!(f, "inv"),
            Token::Pi => write!(f, "pi"),
            Token::FloatLiteral(v) => write!(f, "{v}"),
            Token::IntLiteral(v) => write!(f, "{v}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::EqEq => write!(f, "=="),
            Token::Arrow => write!(f, "->"),
            Token::At => write!(f, "@"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// A token with its position.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    /// 1-based source line.
    pub line: usize,
}

/// A token the lexer could not read.
#[derive(Debug, Clone)]
pub struct LexError {
    pub line: usize,
    pub message: String,
}

/// Tokenize a QASM source string.
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken, LexError>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut scanned = 0;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        line += source[scanned..span.start].matches('\n').count();
        scanned = span.start;
        match result {
            Ok(token) => tokens.push(Ok(SpannedToken { token, line })),
            Err(()) => {
                let slice = &source[span];
                tokens.push(Err(LexError {
                    line,
                    message: format!("Invalid token: '{slice}'"),
                }));
            }
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<SpannedToken> {
        tokenize(source).into_iter().filter_map(Result::ok).collect()
    }

    #[test]
    fn test_header_tokens() {
        let tokens = tokens("OPENQASM 2.0;\ninclude \"qelib1.inc\";");
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens[0].token, Token::OpenQasm);
        assert!(matches!(tokens[1].token, Token::FloatLiteral(v) if (v - 2.0).abs() < 0.001));
        assert_eq!(tokens[3].token, Token::Include);
        assert!(matches!(tokens[4].token, Token::StringLiteral(ref s) if s == "qelib1.inc"));
        assert_eq!(tokens[4].line, 2);
    }

    #[test]
    fn test_register_declaration() {
        let tokens = tokens("qreg q[2];");
        assert_eq!(tokens[0].token, Token::QReg);
        assert!(matches!(tokens[1].token, Token::Identifier(ref s) if s == "q"));
        assert_eq!(tokens[2].token, Token::LBracket);
        assert!(matches!(tokens[3].token, Token::IntLiteral(2)));
        assert_eq!(tokens[4].token, Token::RBracket);
        assert_eq!(tokens[5].token, Token::Semicolon);
    }

    #[test]
    fn test_conditioned_measure() {
        let tokens = tokens("if(c==1) measure q[0] -> c[0];");
        assert_eq!(tokens[0].token, Token::If);
        assert_eq!(tokens[3].token, Token::EqEq);
        assert_eq!(tokens[6].token, Token::Measure);
        assert_eq!(tokens[11].token, Token::Arrow);
    }

    #[test]
    fn test_adjoint_prefix() {
        let tokens = tokens("inv @ rot2(-(pi)) q[0];");
        assert_eq!(tokens[0].token, Token::Inv);
        assert_eq!(tokens[1].token, Token::At);
        assert_eq!(tokens[4].token, Token::Minus);
        assert_eq!(tokens[6].token, Token::Pi);
    }

    #[test]
    fn test_comments_and_lines() {
        let source = "// header\nqreg q[1];\n\n// trailing\nh q[0];";
        let tokens = tokens(source);
        assert_eq!(tokens.len(), 11);
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[6].line, 5);
    }

    #[test]
    fn test_invalid_token() {
        let results = tokenize("qreg q[1];\n$");
        let err = results.into_iter().find_map(Result::err).unwrap();
        assert_eq!(err.line, 2);
    }
}
