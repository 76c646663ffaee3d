use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Select,
    From,
    Where,
    Group,
    By,
    Order,
    Limit,
    As,
    Like,
    Count,
    Create,
    Table,
    Drop,
    If,
    Not,
    Exists,
    Delete,
    Insert,
    Into,
    Values,

    // Literals
    Integer(i64),
    Float(f64),
    String(String),
    Identifier(String),

    // Operators and punctuation
    Plus,
    Minus,
    Star,
    Eq,
    Gt,
    Comma,
    Dot,
    Semicolon,
    LParen,
    RParen,

    /// Any character the dialect has no use for. Kept as a token so that
    /// ignored parts of a statement (column types, constraints) still lex.
    Symbol(char),

    Eof,
}

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("select", TokenKind::Select),
    ("from", TokenKind::From),
    ("where", TokenKind::Where),
    ("group", TokenKind::Group),
    ("by", TokenKind::By),
    ("order", TokenKind::Order),
    ("limit", TokenKind::Limit),
    ("as", TokenKind::As),
    ("like", TokenKind::Like),
    ("count", TokenKind::Count),
    ("create", TokenKind::Create),
    ("table", TokenKind::Table),
    ("drop", TokenKind::Drop),
    ("if", TokenKind::If),
    ("not", TokenKind::Not),
    ("exists", TokenKind::Exists),
    ("delete", TokenKind::Delete),
    ("insert", TokenKind::Insert),
    ("into", TokenKind::Into),
    ("values", TokenKind::Values),
];

impl TokenKind {
    /// The lower-cased word a keyword token was read from.
    pub fn keyword(&self) -> Option<&'static str> {
        KEYWORDS
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(word, _)| *word)
    }

    fn from_word(word: &str) -> Self {
        KEYWORDS
            .iter()
            .find(|(keyword, _)| keyword.eq_ignore_ascii_case(word))
            .map(|(_, kind)| kind.clone())
            .unwrap_or_else(|| TokenKind::Identifier(word.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token's first character.
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, position: usize) -> Self {
        Self { kind, position }
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Splits the input into tokens. The last token is always `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        tokens.push(Token::new(TokenKind::Eof, self.input.len()));
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, String> {
        loop {
            self.eat_while(char::is_whitespace);

            let (start, c) = match self.chars.next() {
                Some(next) => next,
                None => return Ok(None),
            };

            let kind = match c {
                '-' if self.next_is('-') => {
                    self.eat_while(|c| c != '\n');
                    continue;
                }
                '/' if self.next_is('*') => {
                    self.skip_block_comment(start)?;
                    continue;
                }
                ',' => TokenKind::Comma,
                '.' => TokenKind::Dot,
                ';' => TokenKind::Semicolon,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '=' => TokenKind::Eq,
                '>' => TokenKind::Gt,
                '\'' => TokenKind::String(self.read_quoted('\'', start)?),
                '"' | '`' => TokenKind::Identifier(self.read_quoted(c, start)?),
                c if c.is_ascii_digit() => self.read_number(start)?,
                c if c.is_alphabetic() || c == '_' => {
                    let end = self.eat_while(|c| c.is_alphanumeric() || c == '_');
                    TokenKind::from_word(&self.input[start..end])
                }
                other => TokenKind::Symbol(other),
            };

            return Ok(Some(Token::new(kind, start)));
        }
    }

    /// Consumes characters while `pred` holds and returns the byte offset
    /// of the first one left.
    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        while let Some(&(_, c)) = self.chars.peek() {
            if !pred(c) {
                break;
            }
            self.chars.next();
        }
        self.offset()
    }

    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn next_is(&mut self, expected: char) -> bool {
        self.chars.peek().map(|&(_, c)| c) == Some(expected)
    }

    fn skip_block_comment(&mut self, start: usize) -> Result<(), String> {
        self.chars.next();
        let mut previous = '\0';
        for (_, c) in self.chars.by_ref() {
            if previous == '*' && c == '/' {
                return Ok(());
            }
            previous = c;
        }
        Err(format!("Unterminated block comment at position {}", start))
    }

    /// Reads up to the closing `quote`; a doubled quote stands for itself.
    fn read_quoted(&mut self, quote: char, start: usize) -> Result<String, String> {
        let mut value = String::new();
        loop {
            match self.chars.next() {
                None => return Err(format!("Unterminated {} at position {}", quote, start)),
                Some((_, c)) if c == quote => {
                    if !self.next_is(quote) {
                        return Ok(value);
                    }
                    self.chars.next();
                    value.push(quote);
                }
                Some((_, c)) => value.push(c),
            }
        }
    }

    fn read_number(&mut self, start: usize) -> Result<TokenKind, String> {
        let mut end = self.eat_while(|c| c.is_ascii_digit());
        let has_dot = self.next_is('.');
        if has_dot {
            self.chars.next();
            end = self.eat_while(|c| c.is_ascii_digit());
        }

        let text = &self.input[start..end];
        let parsed = if has_dot {
            text.parse::<f64>().map(TokenKind::Float).ok()
        } else {
            // Integers too wide for i64 degrade to floats.
            text.parse::<i64>()
                .map(TokenKind::Integer)
                .or_else(|_| text.parse::<f64>().map(TokenKind::Float))
                .ok()
        };
        parsed.ok_or_else(|| format!("Invalid number literal: {}", text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str) -> Vec<TokenKind> {
        Lexer::new(sql)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_select() {
        assert_eq!(
            kinds("SELECT * FROM users"),
            vec![
                TokenKind::Select,
                TokenKind::Star,
                TokenKind::From,
                TokenKind::Identifier("users".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let tokens = kinds("insert Into t vaLues");
        assert_eq!(tokens[0], TokenKind::Insert);
        assert_eq!(tokens[1], TokenKind::Into);
        assert_eq!(tokens[3], TokenKind::Values);
    }

    #[test]
    fn test_keyword_words() {
        assert_eq!(TokenKind::Order.keyword(), Some("order"));
        assert_eq!(TokenKind::Values.keyword(), Some("values"));
        assert_eq!(TokenKind::Identifier("users".into()).keyword(), None);
        assert_eq!(TokenKind::Star.keyword(), None);
    }

    #[test]
    fn test_escaped_string() {
        assert_eq!(kinds("'it''s a test'")[0], TokenKind::String("it's a test".into()));
    }

    #[test]
    fn test_quoted_identifier() {
        assert_eq!(
            kinds("\"Line Items\"")[0],
            TokenKind::Identifier("Line Items".into())
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert!(Lexer::new("SELECT 'oops").tokenize().is_err());
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("42 149.50 99999999999999999999");
        assert_eq!(tokens[0], TokenKind::Integer(42));
        assert_eq!(tokens[1], TokenKind::Float(149.5));
        assert!(matches!(tokens[2], TokenKind::Float(f) if f > 9.9e19));
    }

    #[test]
    fn test_comparison_operators() {
        // Only `=` and `>` have tokens of their own.
        assert_eq!(
            kinds("= > >= <>"),
            vec![
                TokenKind::Eq,
                TokenKind::Gt,
                TokenKind::Gt,
                TokenKind::Eq,
                TokenKind::Symbol('<'),
                TokenKind::Gt,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unknown_characters_become_symbols() {
        let tokens = kinds("email @ # /");
        assert_eq!(tokens[1], TokenKind::Symbol('@'));
        assert_eq!(tokens[2], TokenKind::Symbol('#'));
        assert_eq!(tokens[3], TokenKind::Symbol('/'));
    }

    #[test]
    fn test_comments() {
        let tokens = kinds("-- Database Schema\n\nCREATE /* users */ TABLE users");
        assert_eq!(tokens[0], TokenKind::Create);
        assert_eq!(tokens[1], TokenKind::Table);
        assert!(Lexer::new("/* open").tokenize().is_err());
    }

    #[test]
    fn test_byte_positions() {
        let tokens = Lexer::new("'café' x").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String("café".into()));
        assert_eq!(tokens[1].position, 8);
        assert_eq!(tokens[2].position, 9);
    }
}
