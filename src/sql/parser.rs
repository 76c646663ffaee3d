use super::ast::*;
use super::lexer::{Lexer, Token, TokenKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found:?} at position {position}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        position: usize,
    },
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Lexer error: {0}")]
    LexerError(String),
    #[error("Malformed literal '{literal}' at position {position}")]
    MalformedLiteral { literal: String, position: usize },
    #[error("Unrecognized statement: {0}")]
    UnknownStatement(String),
}

pub struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    position: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize().map_err(ParseError::LexerError)?;
        Ok(Self {
            input,
            tokens,
            position: 0,
        })
    }

    /// Parses exactly one statement, optionally terminated by `;`.
    pub fn parse(&mut self) -> Result<Statement, ParseError> {
        let stmt = match self.peek_kind() {
            Some(TokenKind::Create) => self.parse_create_table()?,
            Some(TokenKind::Drop) => self.parse_drop_table()?,
            Some(TokenKind::Delete) => self.parse_delete()?,
            Some(TokenKind::Insert) => self.parse_insert()?,
            Some(TokenKind::Select) => Statement::Select(self.parse_select()?),
            Some(TokenKind::Eof) | None => return Err(ParseError::UnexpectedEof),
            _ => {
                return Err(ParseError::UnknownStatement(
                    self.source_text(self.position, self.tokens.len() - 1),
                ))
            }
        };

        if self.check(&TokenKind::Semicolon) {
            self.advance();
        }
        self.expect(TokenKind::Eof)?;

        Ok(stmt)
    }

    fn parse_create_table(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::Create)?;
        self.expect(TokenKind::Table)?;

        if self.check(&TokenKind::If) && self.peek_next_kind() == Some(&TokenKind::Not) {
            self.advance();
            self.advance();
            self.expect(TokenKind::Exists)?;
        }

        let name = self.parse_name()?;

        // Column definitions are accepted but not interpreted.
        while !self.check(&TokenKind::Eof) {
            self.advance();
        }

        Ok(Statement::CreateTable { name })
    }

    fn parse_drop_table(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::Drop)?;
        self.expect(TokenKind::Table)?;

        let if_exists =
            self.check(&TokenKind::If) && self.peek_next_kind() == Some(&TokenKind::Exists);
        if if_exists {
            self.advance();
            self.advance();
        }

        let name = self.parse_name()?;
        Ok(Statement::DropTable { name, if_exists })
    }

    fn parse_delete(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::Delete)?;
        self.expect(TokenKind::From)?;
        let table = self.parse_name()?;
        Ok(Statement::Delete { table })
    }

    fn parse_insert(&mut self) -> Result<Statement, ParseError> {
        self.expect(TokenKind::Insert)?;
        self.expect(TokenKind::Into)?;
        let table = self.parse_name()?;

        // The column list is accepted and ignored; values are positional.
        if self.check(&TokenKind::LParen) {
            self.advance();
            loop {
                self.parse_name()?;
                if self.check(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
        }

        self.expect(TokenKind::Values)?;

        let mut rows = Vec::new();
        loop {
            rows.push(self.parse_value_tuple()?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        Ok(Statement::Insert { table, rows })
    }

    fn parse_value_tuple(&mut self) -> Result<Vec<Literal>, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut values = Vec::new();

        if self.check(&TokenKind::RParen) {
            self.advance();
            return Ok(values);
        }

        loop {
            values.push(self.parse_literal()?);

            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        self.expect(TokenKind::RParen)?;
        Ok(values)
    }

    /// Reads the tokens up to the next `,` or `)` and interprets them as one
    /// literal. Anything that is not a single quoted string, number, signed
    /// number or bare word is reported as malformed.
    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        let start = self.position;
        let mut end = start;
        while let Some(kind) = self.tokens.get(end).map(|t| &t.kind) {
            if matches!(kind, TokenKind::Comma | TokenKind::RParen | TokenKind::Eof) {
                break;
            }
            end += 1;
        }

        let kinds: Vec<&TokenKind> = self.tokens[start..end].iter().map(|t| &t.kind).collect();
        let literal = match kinds.as_slice() {
            [TokenKind::String(s)] => Some(Literal::Quoted(s.clone())),
            [TokenKind::Integer(i)] => Some(Literal::Integer(*i)),
            [TokenKind::Float(f)] => Some(Literal::Float(*f)),
            [TokenKind::Minus, TokenKind::Integer(i)] => Some(Literal::Integer(-*i)),
            [TokenKind::Minus, TokenKind::Float(f)] => Some(Literal::Float(-*f)),
            [TokenKind::Plus, TokenKind::Integer(i)] => Some(Literal::Integer(*i)),
            [TokenKind::Plus, TokenKind::Float(f)] => Some(Literal::Float(*f)),
            [TokenKind::Identifier(word)] => Some(Literal::Bare(word.clone())),
            _ => None,
        };

        match literal {
            Some(literal) => {
                self.position = end;
                Ok(literal)
            }
            None if start == end => Err(self.unexpected_token("literal")),
            None => Err(ParseError::MalformedLiteral {
                literal: self.source_text(start, end),
                position: self.tokens[start].position,
            }),
        }
    }

    fn parse_select(&mut self) -> Result<SelectStatement, ParseError> {
        self.expect(TokenKind::Select)?;

        let mut stmt = SelectStatement::new();
        stmt.columns = self.parse_select_columns()?;

        if !self.check(&TokenKind::From) {
            return Ok(stmt);
        }
        self.advance();
        stmt.from = Some(self.parse_name()?);
        self.skip_alias();

        if self.check(&TokenKind::Where) {
            self.advance();
            stmt.where_clause = Some(self.parse_where_clause()?);
        }

        if self.check(&TokenKind::Group) {
            self.advance();
            self.expect(TokenKind::By)?;
            stmt.group_by = Some(self.parse_column_ref()?);
        }

        stmt.trailing = self.skip_to_end();
        Ok(stmt)
    }

    fn parse_select_columns(&mut self) -> Result<Vec<SelectColumn>, ParseError> {
        let mut columns = Vec::new();

        loop {
            columns.push(self.parse_select_column()?);

            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        Ok(columns)
    }

    /// One select item, with or without an alias. Items that are not `*`,
    /// `t.*`, `COUNT(*)` or a column come back as `Expression`.
    fn parse_select_column(&mut self) -> Result<SelectColumn, ParseError> {
        let start = self.position;
        let end = self.select_item_end(start);
        if start == end {
            return Err(self.unexpected_token("select item"));
        }

        let kinds: Vec<&TokenKind> = self.tokens[start..end].iter().map(|t| &t.kind).collect();
        let body = match kinds.as_slice() {
            [body @ .., TokenKind::As, TokenKind::Identifier(_)] => body,
            all => all,
        };
        let column = select_column(body).or_else(|| match body {
            [body @ .., TokenKind::Identifier(_)] => select_column(body),
            _ => None,
        });

        let column = column.unwrap_or_else(|| SelectColumn::Expression(self.source_text(start, end)));
        self.position = end;
        Ok(column)
    }

    /// Index of the `,` or `FROM` that ends the select item at `start`,
    /// skipping over parenthesized arguments.
    fn select_item_end(&self, start: usize) -> usize {
        let mut depth = 0usize;
        let mut end = start;
        while let Some(kind) = self.tokens.get(end).map(|t| &t.kind) {
            match kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth = depth.saturating_sub(1),
                TokenKind::Comma | TokenKind::From if depth == 0 => break,
                TokenKind::Semicolon | TokenKind::Eof => break,
                _ => {}
            }
            end += 1;
        }
        end
    }

    /// `FROM users u` and `FROM users AS u` both read as `FROM users`.
    fn skip_alias(&mut self) {
        if self.check(&TokenKind::As) {
            self.advance();
        }
        if let Some(TokenKind::Identifier(_)) = self.peek_kind() {
            self.advance();
        }
    }

    /// Consumes the rest of the statement and returns its text, if any.
    fn skip_to_end(&mut self) -> Option<String> {
        let start = self.position;
        while !matches!(
            self.peek_kind(),
            Some(TokenKind::Semicolon) | Some(TokenKind::Eof) | None
        ) {
            self.advance();
        }
        (self.position > start).then(|| self.source_text(start, self.position))
    }

    /// The clause runs up to the next clause keyword. It is recognized only if
    /// it is exactly one of the supported comparisons; anything else, including
    /// conjunctions, comes back as `Predicate::Unsupported`.
    fn parse_where_clause(&mut self) -> Result<Predicate, ParseError> {
        let start = self.position;
        let mut end = start;
        while let Some(kind) = self.tokens.get(end).map(|t| &t.kind) {
            if matches!(
                kind,
                TokenKind::Group
                    | TokenKind::Order
                    | TokenKind::Limit
                    | TokenKind::Semicolon
                    | TokenKind::Eof
            ) {
                break;
            }
            end += 1;
        }

        if start == end {
            return Err(self.unexpected_token("predicate"));
        }

        let predicate = self.try_comparison(end);
        self.position = end;

        Ok(predicate.unwrap_or_else(|| Predicate::Unsupported(self.source_text(start, end))))
    }

    fn try_comparison(&mut self, end: usize) -> Option<Predicate> {
        let column = self.parse_column_ref().ok()?;

        let op = self.peek_kind()?.clone();
        self.advance();

        let predicate = match (op, self.peek_kind()?.clone()) {
            (TokenKind::Like, TokenKind::String(pattern)) => {
                self.advance();
                Predicate::Like { column, pattern }
            }
            (TokenKind::Eq, TokenKind::String(value)) => {
                self.advance();
                Predicate::StringEq { column, value }
            }
            (TokenKind::Eq, _) => Predicate::NumberEq {
                column,
                value: self.parse_number()?,
            },
            (TokenKind::Gt, _) => Predicate::GreaterThan {
                column,
                threshold: self.parse_number()?,
            },
            _ => return None,
        };

        if self.position == end {
            Some(predicate)
        } else {
            None
        }
    }

    fn parse_number(&mut self) -> Option<f64> {
        let negative = match self.peek_kind()? {
            TokenKind::Minus => {
                self.advance();
                true
            }
            _ => false,
        };

        let value = match self.peek_kind()? {
            TokenKind::Integer(i) => *i as f64,
            TokenKind::Float(f) => *f,
            _ => return None,
        };
        self.advance();

        Some(if negative { -value } else { value })
    }

    fn parse_column_ref(&mut self) -> Result<ColumnRef, ParseError> {
        let name = self.parse_identifier()?;

        if self.check(&TokenKind::Dot) {
            self.advance();
            let column = self.parse_identifier()?;
            return Ok(ColumnRef::with_table(name, column));
        }

        Ok(ColumnRef::new(name))
    }

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        match self.peek_kind().cloned() {
            Some(TokenKind::Identifier(name)) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected_token("identifier")),
        }
    }

    /// A table or column name in DDL/DML position. Keywords are accepted
    /// as plain words there, so a table may be called `order` or `values`.
    fn parse_name(&mut self) -> Result<String, ParseError> {
        let name = match self.peek_kind() {
            Some(TokenKind::Identifier(name)) => name.clone(),
            Some(kind) => match kind.keyword() {
                Some(word) => word.to_string(),
                None => return Err(self.unexpected_token("name")),
            },
            None => return Err(self.unexpected_token("name")),
        };
        self.advance();
        Ok(name)
    }

    /// Source text spanning tokens `start..end`.
    fn source_text(&self, start: usize, end: usize) -> String {
        let from = self.tokens.get(start).map(|t| t.position).unwrap_or(0);
        let to = self
            .tokens
            .get(end)
            .map(|t| t.position)
            .unwrap_or(self.input.len());
        self.input.get(from..to).unwrap_or_default().trim().to_string()
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.position).map(|t| &t.kind)
    }

    fn peek_next_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.position + 1).map(|t| &t.kind)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn advance(&mut self) -> Option<&Token> {
        if self.position < self.tokens.len() {
            let token = &self.tokens[self.position];
            self.position += 1;
            Some(token)
        } else {
            None
        }
    }

    fn expect(&mut self, expected: TokenKind) -> Result<(), ParseError> {
        if self.check(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected_token(&format!("{:?}", expected)))
        }
    }

    fn unexpected_token(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.position) {
            Some(token) if token.kind != TokenKind::Eof => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.kind.clone(),
                position: token.position,
            },
            _ => ParseError::UnexpectedEof,
        }
    }
}

fn select_column(kinds: &[&TokenKind]) -> Option<SelectColumn> {
    match kinds {
        [TokenKind::Star] | [TokenKind::Identifier(_), TokenKind::Dot, TokenKind::Star] => {
            Some(SelectColumn::AllColumns)
        }
        [TokenKind::Count, TokenKind::LParen, TokenKind::Star, TokenKind::RParen] => {
            Some(SelectColumn::CountAll)
        }
        [TokenKind::Identifier(column)] => Some(SelectColumn::Column(ColumnRef::new(column.clone()))),
        [TokenKind::Identifier(table), TokenKind::Dot, TokenKind::Identifier(column)] => Some(
            SelectColumn::Column(ColumnRef::with_table(table.clone(), column.clone())),
        ),
        _ => None,
    }
}

/// Convenience wrapper: lex and parse a single statement.
pub fn parse_statement(sql: &str) -> Result<Statement, ParseError> {
    Parser::new(sql)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(sql: &str) -> SelectStatement {
        match parse_statement(sql).unwrap() {
            Statement::Select(stmt) => stmt,
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    #[test]
    fn test_create_table_ignores_columns() {
        let stmt = parse_statement(
            "CREATE TABLE Users (\n  id INT PRIMARY KEY,\n  total DECIMAL(10,2)\n)",
        )
        .unwrap();
        assert_eq!(stmt, Statement::CreateTable { name: "Users".into() });
    }

    #[test]
    fn test_create_table_if_not_exists() {
        let stmt = parse_statement("create table if not exists posts (id INT)").unwrap();
        assert_eq!(stmt, Statement::CreateTable { name: "posts".into() });
    }

    #[test]
    fn test_leading_comment() {
        let stmt = parse_statement("-- Database Schema\n\nCREATE TABLE users (id INT)").unwrap();
        assert_eq!(stmt, Statement::CreateTable { name: "users".into() });
    }

    #[test]
    fn test_drop_table() {
        assert_eq!(
            parse_statement("DROP TABLE IF EXISTS users;").unwrap(),
            Statement::DropTable {
                name: "users".into(),
                if_exists: true
            }
        );
        assert_eq!(
            parse_statement("drop table orders").unwrap(),
            Statement::DropTable {
                name: "orders".into(),
                if_exists: false
            }
        );
    }

    #[test]
    fn test_delete_rejects_where() {
        assert_eq!(
            parse_statement("DELETE FROM users").unwrap(),
            Statement::Delete { table: "users".into() }
        );
        assert!(parse_statement("DELETE FROM users WHERE id = 1").is_err());
    }

    #[test]
    fn test_insert_values() {
        let stmt =
            parse_statement("INSERT INTO orders VALUES (1, -2, 'O''Brien', 149.50, pending)")
                .unwrap();
        assert_eq!(
            stmt,
            Statement::Insert {
                table: "orders".into(),
                rows: vec![vec![
                    Literal::Integer(1),
                    Literal::Integer(-2),
                    Literal::Quoted("O'Brien".into()),
                    Literal::Float(149.5),
                    Literal::Bare("pending".into()),
                ]],
            }
        );
    }

    #[test]
    fn test_insert_column_list_and_many_rows() {
        let stmt = parse_statement("INSERT INTO likes (id, user_id, post_id) VALUES (1, 1, 2), (2, 3, 2)")
            .unwrap();
        match stmt {
            Statement::Insert { rows, .. } => assert_eq!(rows.len(), 2),
            other => panic!("expected INSERT, got {:?}", other),
        }
    }

    #[test]
    fn test_insert_malformed_literal() {
        let err = parse_statement("INSERT INTO users VALUES (1, 2 3)").unwrap_err();
        assert_eq!(
            err,
            ParseError::MalformedLiteral {
                literal: "2 3".into(),
                position: 29
            }
        );
    }

    #[test]
    fn test_simple_select() {
        let stmt = select("SELECT * FROM users");
        assert_eq!(stmt.columns, vec![SelectColumn::AllColumns]);
        assert_eq!(stmt.from.as_deref(), Some("users"));
        assert!(stmt.where_clause.is_none());
    }

    #[test]
    fn test_select_without_from() {
        let stmt = select("SELECT *");
        assert!(stmt.from.is_none());
    }

    #[test]
    fn test_count_and_group_by() {
        let stmt = select("SELECT customer_id, COUNT(*) FROM orders GROUP BY customer_id");
        assert!(stmt.has_count());
        assert_eq!(stmt.group_by, Some(ColumnRef::new("customer_id")));
    }

    #[test]
    fn test_like_predicate() {
        let stmt = select("SELECT * FROM users WHERE email LIKE '%gmail.com%'");
        assert_eq!(
            stmt.where_clause,
            Some(Predicate::Like {
                column: ColumnRef::new("email"),
                pattern: "%gmail.com%".into()
            })
        );
    }

    #[test]
    fn test_equality_predicates() {
        let stmt = select("SELECT * FROM users WHERE users.email = 'bob@yahoo.com'");
        assert_eq!(
            stmt.where_clause,
            Some(Predicate::StringEq {
                column: ColumnRef::with_table("users", "email"),
                value: "bob@yahoo.com".into()
            })
        );

        let stmt = select("SELECT * FROM users WHERE id = 2");
        assert_eq!(
            stmt.where_clause,
            Some(Predicate::NumberEq {
                column: ColumnRef::new("id"),
                value: 2.0
            })
        );
    }

    #[test]
    fn test_greater_than_predicate() {
        let stmt = select("SELECT * FROM orders WHERE total > 100 GROUP BY customer_id");
        assert_eq!(
            stmt.where_clause,
            Some(Predicate::GreaterThan {
                column: ColumnRef::new("total"),
                threshold: 100.0
            })
        );
        assert!(stmt.group_by.is_some());
    }

    #[test]
    fn test_unsupported_predicates_keep_text() {
        let stmt = select("SELECT * FROM users WHERE id = 1 AND name = 'x'");
        assert_eq!(
            stmt.where_clause,
            Some(Predicate::Unsupported("id = 1 AND name = 'x'".into()))
        );

        let stmt = select("SELECT * FROM orders WHERE total >= 100");
        assert_eq!(
            stmt.where_clause,
            Some(Predicate::Unsupported("total >= 100".into()))
        );
    }

    #[test]
    fn test_trailing_clauses_are_kept() {
        let stmt = select("SELECT * FROM users ORDER BY id LIMIT 2;");
        assert_eq!(stmt.from.as_deref(), Some("users"));
        assert_eq!(stmt.trailing.as_deref(), Some("ORDER BY id LIMIT 2"));

        let stmt = select("SELECT * FROM users WHERE name LIKE '%a%' ORDER BY id");
        assert!(matches!(stmt.where_clause, Some(Predicate::Like { .. })));
        assert_eq!(stmt.trailing.as_deref(), Some("ORDER BY id"));

        let stmt = select("SELECT customer_id, COUNT(*) FROM orders GROUP BY customer_id LIMIT 1");
        assert!(stmt.group_by.is_some());
        assert_eq!(stmt.trailing.as_deref(), Some("LIMIT 1"));

        assert!(select("SELECT * FROM users").trailing.is_none());
    }

    #[test]
    fn test_select_aliases() {
        let stmt = select("SELECT COUNT(*) AS total FROM users u");
        assert_eq!(stmt.columns, vec![SelectColumn::CountAll]);
        assert_eq!(stmt.from.as_deref(), Some("users"));
        assert!(stmt.trailing.is_none());

        let stmt = select("SELECT name n, users.email AS e FROM users AS x WHERE id = 1");
        assert_eq!(
            stmt.columns,
            vec![
                SelectColumn::Column(ColumnRef::new("name")),
                SelectColumn::Column(ColumnRef::with_table("users", "email")),
            ]
        );
        assert!(matches!(stmt.where_clause, Some(Predicate::NumberEq { .. })));
    }

    #[test]
    fn test_unrecognized_select_items() {
        let stmt = select("SELECT COUNT(id), UPPER(name) FROM users");
        assert_eq!(
            stmt.columns,
            vec![
                SelectColumn::Expression("COUNT(id)".into()),
                SelectColumn::Expression("UPPER(name)".into()),
            ]
        );
        assert!(!stmt.has_count());
        assert_eq!(stmt.from.as_deref(), Some("users"));
    }

    #[test]
    fn test_keyword_table_names() {
        assert_eq!(
            parse_statement("CREATE TABLE order (\n  id INT PRIMARY KEY\n)").unwrap(),
            Statement::CreateTable { name: "order".into() }
        );
        assert_eq!(
            parse_statement("DROP TABLE IF EXISTS count").unwrap(),
            Statement::DropTable {
                name: "count".into(),
                if_exists: true
            }
        );
        assert_eq!(
            parse_statement("DELETE FROM limit").unwrap(),
            Statement::Delete { table: "limit".into() }
        );
        match parse_statement("INSERT INTO values VALUES (1, 'x')").unwrap() {
            Statement::Insert { table, rows } => {
                assert_eq!(table, "values");
                assert_eq!(rows.len(), 1);
            }
            other => panic!("expected INSERT, got {:?}", other),
        }
        let stmt = select("SELECT COUNT(*) FROM order WHERE id > 1");
        assert_eq!(stmt.from.as_deref(), Some("order"));
        assert!(matches!(stmt.where_clause, Some(Predicate::GreaterThan { .. })));
    }

    #[test]
    fn test_incomplete_select_is_an_error() {
        assert_eq!(parse_statement("SELECT * FROM"), Err(ParseError::UnexpectedEof));
        assert!(parse_statement("SELECT FROM users").is_err());
    }

    #[test]
    fn test_unknown_statement() {
        assert_eq!(
            parse_statement("UPDATE users SET name = 'x'"),
            Err(ParseError::UnknownStatement("UPDATE users SET name = 'x'".into()))
        );
        assert_eq!(parse_statement("   "), Err(ParseError::UnexpectedEof));
    }
}
