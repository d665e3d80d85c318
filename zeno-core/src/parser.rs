//! Parser for Zeno.
//!
//! Statements are parsed by recursive descent, expressions by precedence
//! climbing. Errors never abort the parse: each one is recorded as a
//! [`Diagnostic`] and the parser resynchronizes at the next statement
//! boundary, so one pass reports as many independent defects as it can.

use tracing::debug;

use crate::ast::{
    AssignmentStatement, BinaryExpression, BinaryOp, Block, ElseBranch, Expr, FunctionCall,
    FunctionDefinition, IfStatement, ImportItem, ImportStatement, LetDeclaration, LoopStatement,
    MapEntry, Param, Program, ReturnStatement, Stmt, StmtKind, UnaryExpression, UnaryOp, WhileStatement,
};
use crate::diagnostic::Diagnostic;
use crate::lexer::{Lexer, Token, TokenKind, illegal_token_diagnostic, process_escapes};
use crate::span::Span;

type PResult<T> = Result<T, Diagnostic>;

/// Binding power of expression operators, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Or,         // ||
    And,        // &&
    Equality,   // == !=
    Relational, // < > <= >=
    Sum,        // + -
    Product,    // * / %
    Prefix,     // -x !x
}

fn infix_operator(kind: TokenKind) -> Option<(BinaryOp, Precedence)> {
    let pair = match kind {
        TokenKind::OrOr => (BinaryOp::Or, Precedence::Or),
        TokenKind::AndAnd => (BinaryOp::And, Precedence::And),
        TokenKind::EqEq => (BinaryOp::Eq, Precedence::Equality),
        TokenKind::NotEq => (BinaryOp::NotEq, Precedence::Equality),
        TokenKind::Less => (BinaryOp::Less, Precedence::Relational),
        TokenKind::LessEq => (BinaryOp::LessEq, Precedence::Relational),
        TokenKind::Greater => (BinaryOp::Greater, Precedence::Relational),
        TokenKind::GreaterEq => (BinaryOp::GreaterEq, Precedence::Relational),
        TokenKind::Plus => (BinaryOp::Add, Precedence::Sum),
        TokenKind::Minus => (BinaryOp::Sub, Precedence::Sum),
        TokenKind::Star => (BinaryOp::Mul, Precedence::Product),
        TokenKind::Slash => (BinaryOp::Div, Precedence::Product),
        TokenKind::Percent => (BinaryOp::Rem, Precedence::Product),
        _ => return None,
    };
    Some(pair)
}

/// Program plus every syntax error found on the way.
#[derive(Debug)]
pub struct ParseOutput {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Parse a whole source file.
pub fn parse(source: &str) -> ParseOutput {
    let mut parser = Parser::new(source);
    let program = parser.parse_program();
    debug!(
        statements = program.statements.len(),
        errors = parser.diagnostics.len(),
        "parsed program"
    );
    ParseOutput {
        program,
        diagnostics: parser.diagnostics,
    }
}

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token<'src>,
    peek: Token<'src>,
    prev_span: Span,
    /// Depth of open parentheses; newlines only end statements at depth 0.
    nesting: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Parser {
            lexer,
            current,
            peek,
            prev_span: Span::default(),
            nesting: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Primary messages of every error recorded so far, each prefixed
    /// with `line:column`.
    pub fn errors(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .map(|d| format!("{}: {}", d.span, d.message))
            .collect()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while self.current.kind != TokenKind::Eof {
            if self.current.kind == TokenKind::Semi {
                self.advance();
                continue;
            }
            if let Some(stmt) = self.parse_statement_recovering(true) {
                statements.push(stmt);
            }
        }
        Program { statements }
    }

    // -----------------------------------------------------------------
    // Token cursor
    // -----------------------------------------------------------------

    fn advance(&mut self) -> Token<'src> {
        let next = self.lexer.next_token();
        let previous = core::mem::replace(&mut self.current, core::mem::replace(&mut self.peek, next));
        self.prev_span = previous.span;
        previous
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<Token<'src>> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind))
        }
    }

    fn unexpected(&self, expected: TokenKind) -> Diagnostic {
        let got = describe(&self.current);
        let mut diag = Diagnostic::error(
            format!("expected next token to be {expected}, got {got} instead"),
            self.current.span,
        )
        .with_code("E0100")
        .with_mismatch(expected.to_string(), got.clone())
        .with_secondary(format!(
            "次のトークンは {expected} であるべきですが、{got} が見つかりました"
        ));
        if let Some(help) = help_for(expected) {
            diag = diag.with_help(help);
        }
        diag
    }

    fn error_here(&self, code: &'static str, message: String, secondary: String) -> Diagnostic {
        Diagnostic::error(message, self.current.span)
            .with_code(code)
            .with_secondary(secondary)
    }

    /// Skip tokens until something that can start or end a statement.
    fn synchronize(&mut self, start: u32) {
        self.nesting = 0;
        if self.current.span.start == start && !self.at(TokenKind::Eof) {
            self.advance();
        }
        let mut depth = 0usize;
        while !self.at(TokenKind::Eof) {
            match self.current.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace if depth > 0 => depth -= 1,
                TokenKind::RBrace => return,
                TokenKind::Semi if depth == 0 => {
                    self.advance();
                    return;
                }
                kind if depth == 0 && (self.current.newline_before || kind.starts_statement()) => {
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    fn parse_statement_recovering(&mut self, top_level: bool) -> Option<Stmt> {
        let start = self.current.span.start;
        match self.parse_statement(top_level).and_then(|stmt| self.finish_statement(stmt)) {
            Ok(stmt) => Some(stmt),
            Err(diag) => {
                self.diagnostics.push(diag);
                self.synchronize(start);
                None
            }
        }
    }

    /// A statement ends at `;`, a newline, `}` or end of input.
    fn finish_statement(&mut self, stmt: Stmt) -> PResult<Stmt> {
        if self.at(TokenKind::Semi) {
            self.advance();
            return Ok(stmt);
        }
        if self.at(TokenKind::Eof) || self.at(TokenKind::RBrace) || self.current.newline_before {
            return Ok(stmt);
        }
        let got = describe(&self.current);
        Err(self.error_here(
            "E0109",
            format!("expected newline or ';' after statement, got {got}"),
            format!("文の後には改行か ';' が必要ですが、{got} が見つかりました"),
        ))
    }

    fn parse_statement(&mut self, top_level: bool) -> PResult<Stmt> {
        let start = self.current.span;
        let kind = match self.current.kind {
            TokenKind::Import if top_level => StmtKind::Import(self.parse_import()?),
            TokenKind::Fn if top_level => StmtKind::Function(self.parse_function(false)?),
            TokenKind::Pub if top_level => {
                self.advance();
                if !self.at(TokenKind::Fn) {
                    return Err(self.error_here(
                        "E0104",
                        "pub can only be used with function definitions".to_string(),
                        "pub は関数定義にのみ使用できます".to_string(),
                    ));
                }
                StmtKind::Function(self.parse_function(true)?)
            }
            TokenKind::Import | TokenKind::Fn | TokenKind::Pub => {
                let what = describe(&self.current);
                return Err(self.error_here(
                    "E0110",
                    format!("{what} is only allowed at the top level"),
                    format!("{what} はトップレベルでのみ使用できます"),
                ));
            }
            TokenKind::Let | TokenKind::Mut => StmtKind::Let(self.parse_let()?),
            TokenKind::Return => {
                self.advance();
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_expression(Precedence::Lowest)?)
                };
                StmtKind::Return(ReturnStatement { value })
            }
            TokenKind::If => StmtKind::If(self.parse_if()?),
            TokenKind::While => {
                self.advance();
                let condition = self.parse_expression(Precedence::Lowest)?;
                let body = self.parse_block()?;
                StmtKind::While(WhileStatement { condition, body })
            }
            TokenKind::Loop => {
                self.advance();
                StmtKind::Loop(LoopStatement {
                    body: self.parse_block()?,
                })
            }
            TokenKind::Break => {
                self.advance();
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                StmtKind::Continue
            }
            TokenKind::Ident if self.peek.kind == TokenKind::Assign => {
                let name = self.advance();
                self.advance(); // '='
                let value = self.parse_expression(Precedence::Lowest)?;
                StmtKind::Assign(AssignmentStatement {
                    name: name.literal.to_string(),
                    name_span: name.span,
                    value,
                })
            }
            _ => {
                let expr = self.parse_expression(Precedence::Lowest)?;
                if self.at(TokenKind::Assign) {
                    return Err(self.error_here(
                        "E0108",
                        format!("invalid assignment target '{expr}'"),
                        format!("'{expr}' には代入できません"),
                    ));
                }
                StmtKind::Expr(expr)
            }
        };
        Ok(Stmt {
            kind,
            span: start.to(self.prev_span),
        })
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::RBrace | TokenKind::Semi | TokenKind::Eof
        ) || self.current.newline_before
    }

    fn parse_import(&mut self) -> PResult<ImportStatement> {
        self.expect(TokenKind::Import)?;
        self.expect(TokenKind::LBrace)?;
        let mut items = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let name = self.expect(TokenKind::Ident)?;
            let alias = if self.at(TokenKind::As) {
                self.advance();
                Some(self.expect(TokenKind::Ident)?.literal.to_string())
            } else {
                None
            };
            items.push(ImportItem {
                name: name.literal.to_string(),
                alias,
                span: name.span,
            });
            match self.current.kind {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RBrace => {}
                _ => {
                    let got = describe(&self.current);
                    return Err(self.error_here(
                        "E0106",
                        "expected ',' or '}' in import statement".to_string(),
                        format!("import 文には ',' か '}}' が必要ですが、{got} が見つかりました"),
                    )
                    .with_mismatch("',' or '}'", got));
                }
            }
        }
        self.advance(); // '}'
        self.expect(TokenKind::From)?;
        let module = self.expect(TokenKind::StringLiteral)?;
        Ok(ImportStatement {
            module: process_escapes(module.literal),
            items,
        })
    }

    fn parse_function(&mut self, is_public: bool) -> PResult<FunctionDefinition> {
        self.expect(TokenKind::Fn)?;
        let name = self.expect(TokenKind::Ident)?;
        self.expect(TokenKind::LParen)?;
        self.nesting += 1;

        let mut params: Vec<Param> = Vec::new();
        while !self.at(TokenKind::RParen) {
            if params.last().is_some_and(|p| p.variadic) {
                return Err(self.error_here(
                    "E0103",
                    "variadic parameter must be the last parameter".to_string(),
                    "可変長引数は最後の引数でなければなりません".to_string(),
                ));
            }
            let variadic = if self.at(TokenKind::Ellipsis) {
                self.advance();
                true
            } else {
                false
            };
            let param_name = self.expect(TokenKind::Ident)?;
            let ty = self.parse_optional_type()?;
            params.push(Param {
                name: param_name.literal.to_string(),
                ty,
                variadic,
            });
            if self.at(TokenKind::Comma) {
                self.advance();
            } else if !self.at(TokenKind::RParen) {
                return Err(self.unexpected(TokenKind::RParen));
            }
        }
        self.advance(); // ')'
        self.nesting -= 1;

        let return_type = self.parse_optional_type()?;
        let body = self.parse_block()?;
        Ok(FunctionDefinition {
            name: name.literal.to_string(),
            name_span: name.span,
            is_public,
            params,
            return_type,
            body,
        })
    }

    fn parse_optional_type(&mut self) -> PResult<Option<String>> {
        if !self.at(TokenKind::Colon) {
            return Ok(None);
        }
        self.advance();
        let ty = self.expect(TokenKind::Ident)?;
        Ok(Some(ty.literal.to_string()))
    }

    fn parse_let(&mut self) -> PResult<LetDeclaration> {
        let mut mutable = self.at(TokenKind::Mut);
        self.advance(); // 'let' or 'mut'
        if !mutable && self.at(TokenKind::Mut) {
            self.advance();
            mutable = true;
        }
        let name = self.expect(TokenKind::Ident)?;
        let ty = self.parse_optional_type()?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expression(Precedence::Lowest)?;
        Ok(LetDeclaration {
            name: name.literal.to_string(),
            name_span: name.span,
            ty,
            value,
            mutable,
        })
    }

    fn parse_if(&mut self) -> PResult<IfStatement> {
        self.expect(TokenKind::If)?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        let consequence = self.parse_block()?;
        let alternative = if self.at(TokenKind::Else) {
            self.advance();
            match self.current.kind {
                TokenKind::If => Some(ElseBranch::If(Box::new(self.parse_if()?))),
                TokenKind::LBrace => Some(ElseBranch::Block(self.parse_block()?)),
                _ => {
                    let got = describe(&self.current);
                    return Err(self.error_here(
                        "E0105",
                        format!("expected 'if' or '{{' after 'else', got {got}"),
                        format!("'else' の後には 'if' か '{{' が必要ですが、{got} が見つかりました"),
                    ));
                }
            }
        } else {
            None
        };
        Ok(IfStatement {
            condition,
            consequence,
            alternative,
        })
    }

    fn parse_block(&mut self) -> PResult<Block> {
        let open = self.expect(TokenKind::LBrace)?;
        let saved_nesting = core::mem::replace(&mut self.nesting, 0);
        let mut statements = Vec::new();
        loop {
            match self.current.kind {
                TokenKind::RBrace => break,
                TokenKind::Eof => {
                    self.nesting = saved_nesting;
                    return Err(Diagnostic::error("expected '}' to close block", self.current.span)
                        .with_code("E0102")
                        .with_help(format!(
                            "the block opened at line {}, column {} is never closed",
                            open.span.line, open.span.column
                        ))
                        .with_secondary("ブロックを閉じる '}' がありません"));
                }
                TokenKind::Semi => {
                    self.advance();
                }
                _ => {
                    if let Some(stmt) = self.parse_statement_recovering(false) {
                        statements.push(stmt);
                    }
                }
            }
        }
        let close = self.advance();
        self.nesting = saved_nesting;
        Ok(Block {
            statements,
            span: open.span.to(close.span),
        })
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    fn parse_expression(&mut self, precedence: Precedence) -> PResult<Expr> {
        let mut left = self.parse_prefix()?;
        loop {
            if self.nesting == 0 && self.current.newline_before {
                break;
            }
            let Some((op, op_precedence)) = infix_operator(self.current.kind) else {
                break;
            };
            if op_precedence <= precedence {
                break;
            }
            self.advance();
            let right = self.parse_expression(op_precedence)?;
            left = Expr::Binary(BinaryExpression {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> PResult<Expr> {
        let token = self.current;
        match token.kind {
            TokenKind::Ident => {
                self.advance();
                if self.at(TokenKind::LParen) && !self.current.newline_before {
                    let args = self.parse_call_arguments()?;
                    return Ok(Expr::Call(FunctionCall {
                        callee: token.literal.to_string(),
                        args,
                    }));
                }
                Ok(Expr::Identifier(token.literal.to_string()))
            }
            TokenKind::IntLiteral => {
                self.advance();
                token
                    .literal
                    .parse::<i64>()
                    .map(Expr::Integer)
                    .map_err(|_| bad_number(&token, "integer", "整数"))
            }
            TokenKind::FloatLiteral => {
                self.advance();
                token
                    .literal
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .map(Expr::Float)
                    .ok_or_else(|| bad_number(&token, "float", "浮動小数点数"))
            }
            TokenKind::StringLiteral => {
                self.advance();
                Ok(Expr::String(process_escapes(token.literal)))
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                Ok(Expr::Boolean(token.kind == TokenKind::True))
            }
            TokenKind::Minus | TokenKind::Bang => {
                self.advance();
                let op = if token.kind == TokenKind::Minus {
                    UnaryOp::Neg
                } else {
                    UnaryOp::Not
                };
                let operand = self.parse_expression(Precedence::Prefix)?;
                Ok(Expr::Unary(UnaryExpression {
                    op,
                    operand: Box::new(operand),
                }))
            }
            TokenKind::LParen => {
                self.advance();
                self.nesting += 1;
                let inner = self.parse_expression(Precedence::Lowest)?;
                self.expect(TokenKind::RParen)?;
                self.nesting -= 1;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.advance();
                Ok(Expr::Array(self.parse_expression_list(TokenKind::RBracket)?))
            }
            TokenKind::LBrace => self.parse_map_literal(),
            TokenKind::Illegal => Err(illegal_token_diagnostic(&token)),
            _ => {
                let got = describe(&token);
                Err(Diagnostic::error(format!("no prefix parse function for {got} found"), token.span)
                    .with_code("E0101")
                    .with_help("expected an expression here")
                    .with_secondary(format!("{got} から式を始めることはできません")))
            }
        }
    }

    fn parse_call_arguments(&mut self) -> PResult<Vec<Expr>> {
        self.expect(TokenKind::LParen)?;
        self.parse_expression_list(TokenKind::RParen)
    }

    /// Comma-separated expressions up to and including `close`, with the
    /// opening token already consumed. A trailing comma is accepted.
    fn parse_expression_list(&mut self, close: TokenKind) -> PResult<Vec<Expr>> {
        self.nesting += 1;
        let mut items = Vec::new();
        while !self.at(close) {
            items.push(self.parse_expression(Precedence::Lowest)?);
            if self.at(TokenKind::Comma) {
                self.advance();
            } else if !self.at(close) {
                return Err(self.unexpected(close));
            }
        }
        self.advance();
        self.nesting -= 1;
        Ok(items)
    }

    fn parse_map_literal(&mut self) -> PResult<Expr> {
        self.expect(TokenKind::LBrace)?;
        self.nesting += 1;
        let mut entries: Vec<MapEntry> = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let key_token = self.current;
            let key = match key_token.kind {
                TokenKind::Ident => key_token.literal.to_string(),
                TokenKind::StringLiteral => process_escapes(key_token.literal),
                _ => {
                    let got = describe(&key_token);
                    return Err(self.error_here(
                        "E0111",
                        format!("invalid map key: expected identifier or string, got {got}"),
                        format!("マップのキーは識別子か文字列でなければなりませんが、{got} が見つかりました"),
                    ));
                }
            };
            // Go rejects duplicate constant keys in a map literal.
            if entries.iter().any(|entry| entry.key == key) {
                return Err(Diagnostic::error(format!("duplicate map key \"{key}\""), key_token.span)
                    .with_code("E0112")
                    .with_secondary(format!("マップのキー \"{key}\" が重複しています")));
            }
            self.advance();
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression(Precedence::Lowest)?;
            entries.push(MapEntry { key, value });
            if self.at(TokenKind::Comma) {
                self.advance();
            } else if !self.at(TokenKind::RBrace) {
                return Err(self.unexpected(TokenKind::RBrace));
            }
        }
        self.advance(); // '}'
        self.nesting -= 1;
        Ok(Expr::Map(entries))
    }
}

fn describe(token: &Token<'_>) -> String {
    match token.kind {
        TokenKind::Ident => format!("identifier '{}'", token.literal),
        TokenKind::IntLiteral | TokenKind::FloatLiteral => format!("number '{}'", token.literal),
        TokenKind::StringLiteral => format!("string \"{}\"", token.literal),
        TokenKind::Illegal => format!("illegal token '{}'", token.literal),
        kind => kind.to_string(),
    }
}

fn help_for(expected: TokenKind) -> Option<&'static str> {
    match expected {
        TokenKind::RParen => Some("close the parenthesis with ')'"),
        TokenKind::LBrace => Some("blocks start with '{'"),
        TokenKind::Assign => Some("declarations need an initializer: let name = value"),
        TokenKind::From => Some("imports look like: import { name } from \"std/fmt\""),
        TokenKind::Ident => Some("a name is required here"),
        _ => None,
    }
}

fn bad_number(token: &Token<'_>, what: &str, what_ja: &str) -> Diagnostic {
    Diagnostic::error(
        format!("could not parse '{}' as {what}", token.literal),
        token.span,
    )
    .with_code("E0107")
    .with_secondary(format!("'{}' を{what_ja}として解釈できません", token.literal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Program {
        let output = parse(source);
        assert!(
            output.diagnostics.is_empty(),
            "unexpected errors: {:?}",
            output.diagnostics
        );
        output.program
    }

    fn single_expr(source: &str) -> Expr {
        let program = parse_ok(source);
        match &program.statements[0].kind {
            StmtKind::Expr(expr) => expr.clone(),
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn product_binds_tighter_than_sum() {
        assert_eq!(single_expr("2 * 3 + 4").to_string(), "((2 * 3) + 4)");
        assert_eq!(single_expr("2 + 3 * 4").to_string(), "(2 + (3 * 4))");
        assert_eq!(single_expr("10 % 3 - 1").to_string(), "((10 % 3) - 1)");
    }

    #[test]
    fn full_precedence_ladder() {
        assert_eq!(
            single_expr("a || b && c == d < e + f * -g").to_string(),
            "(a || (b && (c == (d < (e + (f * (-g)))))))"
        );
    }

    #[test]
    fn binary_operators_are_left_associative() {
        assert_eq!(single_expr("a - b - c").to_string(), "((a - b) - c)");
        assert_eq!(single_expr("a / b * c").to_string(), "((a / b) * c)");
    }

    #[test]
    fn parentheses_reset_precedence() {
        assert_eq!(single_expr("(2 + 3) * 4").to_string(), "((2 + 3) * 4)");
        assert_eq!(single_expr("!(a && b)").to_string(), "(!(a && b))");
    }

    #[test]
    fn parses_calls_with_arguments() {
        let expr = single_expr("add(1, x * 2, f())");
        let Expr::Call(call) = expr else {
            panic!("expected call");
        };
        assert_eq!(call.callee, "add");
        assert_eq!(call.args.len(), 3);
        assert_eq!(call.args[2], Expr::Call(FunctionCall { callee: "f".to_string(), args: vec![] }));
    }

    #[test]
    fn parses_array_and_map_literals() {
        let expr = single_expr("[1, \"two\", [3.5]]");
        assert_eq!(expr.to_string(), "[1, \"two\", [3.5]]");

        let program = parse_ok("let doc = {\n    name: \"zeno\",\n    \"tab\\tkey\": x + 1,\n}\n");
        let StmtKind::Let(decl) = &program.statements[0].kind else {
            panic!("expected let");
        };
        let Expr::Map(entries) = &decl.value else {
            panic!("expected map literal");
        };
        let keys: Vec<_> = entries.iter().map(|entry| entry.key.as_str()).collect();
        assert_eq!(keys, ["name", "tab\tkey"]);
        assert_eq!(entries[1].value.to_string(), "(x + 1)");
        assert_eq!(single_expr("{}"), Expr::Map(Vec::new()));
    }

    #[test]
    fn rejects_bad_map_keys() {
        let output = parse("let a = { 1: 2 }\nlet b = { k: 1, \"k\": 2 }");
        let codes: Vec<_> = output.diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(codes[0], Some("E0111"));
        assert!(codes.contains(&Some("E0112")), "{codes:?}");
        assert!(output.diagnostics.iter().any(|d| d.message == "duplicate map key \"k\""));
    }

    #[test]
    fn semicolons_are_optional() {
        let with = parse_ok("let x = 10; let y = x + 5; println(y)");
        let without = parse_ok("let x = 10\nlet y = x + 5\nprintln(y)\n");
        assert_eq!(with.statements.len(), 3);
        assert_eq!(with.to_string(), without.to_string());
    }

    #[test]
    fn newline_ends_expression_outside_parentheses() {
        let program = parse_ok("let x = a\n-b");
        assert_eq!(program.statements.len(), 2);
        let program = parse_ok("let x = (a\n- b)");
        assert_eq!(program.statements.len(), 1);
        assert_eq!(program.to_string(), "let x = (a - b)\n");
    }

    #[test]
    fn parses_let_and_mut_declarations() {
        let program = parse_ok("let a: int = 1\nmut b = 2\nlet mut c: string = \"s\"\nb = 3");
        let kinds: Vec<_> = program
            .statements
            .iter()
            .map(|stmt| match &stmt.kind {
                StmtKind::Let(decl) => (decl.name.clone(), decl.mutable, decl.ty.clone()),
                StmtKind::Assign(assign) => (assign.name.clone(), true, None),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("a".to_string(), false, Some("int".to_string())),
                ("b".to_string(), true, None),
                ("c".to_string(), true, Some("string".to_string())),
                ("b".to_string(), true, None),
            ]
        );
    }

    #[test]
    fn parses_function_definitions() {
        let program = parse_ok("pub fn sum(first: int, ...rest: int): int {\n    return first\n}");
        let func = program.functions().next().expect("function");
        assert!(func.is_public);
        assert_eq!(func.name, "sum");
        assert_eq!(func.params.len(), 2);
        assert!(func.is_variadic());
        assert_eq!(func.return_type.as_deref(), Some("int"));
        assert_eq!((func.name_span.line, func.name_span.column), (1, 8));
    }

    #[test]
    fn parses_imports_with_aliases() {
        let program = parse_ok("import { println, readFile as read } from \"std/io\"");
        let import = program.imports().next().expect("import");
        assert_eq!(import.module, "std/io");
        let names: Vec<_> = import.items.iter().map(|i| i.local_name()).collect();
        assert_eq!(names, vec!["println", "read"]);
    }

    #[test]
    fn parses_else_if_chains() {
        let program = parse_ok(
            "if x > 10 {\n    a()\n} else if x > 5 {\n    b()\n} else {\n    c()\n}",
        );
        let StmtKind::If(stmt) = &program.statements[0].kind else {
            panic!("expected if");
        };
        let Some(ElseBranch::If(nested)) = &stmt.alternative else {
            panic!("expected else-if");
        };
        assert!(matches!(nested.alternative, Some(ElseBranch::Block(_))));
    }

    #[test]
    fn parses_loops_and_bare_return() {
        let program = parse_ok("fn f() {\n    while true {\n        break\n    }\n    loop {\n        continue\n    }\n    return\n}");
        let func = program.functions().next().expect("function");
        assert_eq!(func.body.statements.len(), 3);
        assert!(matches!(
            func.body.statements[2].kind,
            StmtKind::Return(ReturnStatement { value: None })
        ));
    }

    #[test]
    fn string_literals_are_escape_processed() {
        assert_eq!(single_expr(r#""a\tb""#), Expr::String("a\tb".to_string()));
    }

    #[test]
    fn reports_missing_paren_with_position() {
        let output = parse("let x = (1 + 2\nlet y = 3");
        assert!(output.has_errors());
        let first = &output.diagnostics[0];
        assert!(first.message.starts_with("expected next token to be ')'"), "{}", first.message);
        assert_eq!(first.code, Some("E0100"));
        assert!(first.secondary.is_some());
    }

    #[test]
    fn accumulates_independent_errors() {
        let source = "let = 1\nlet y = )\nlet ok = 2\nfn (x) {}";
        let mut parser = Parser::new(source);
        let program = parser.parse_program();
        let errors = parser.errors();
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors[1].contains("no prefix parse function for ')' found"));
        assert!(program.statements.iter().any(|s| matches!(&s.kind, StmtKind::Let(d) if d.name == "ok")));
    }

    #[test]
    fn reports_unclosed_block() {
        let output = parse("fn main() {\n    let x = 1\n");
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].message, "expected '}' to close block");
    }

    #[test]
    fn reports_misplaced_variadic_and_pub() {
        let output = parse("fn f(...a: int, b: int) {}\npub let x = 1");
        let messages: Vec<_> = output.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert!(messages.contains(&"variadic parameter must be the last parameter"));
        assert!(messages.contains(&"pub can only be used with function definitions"));
    }

    #[test]
    fn reports_bad_else_and_import_list() {
        let output = parse("if a {} else b()\nimport { x y } from \"std/fmt\"");
        let messages: Vec<_> = output.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert!(messages[0].starts_with("expected 'if' or '{' after 'else'"));
        assert!(messages.contains(&"expected ',' or '}' in import statement"));
    }

    #[test]
    fn reports_illegal_tokens_and_missing_terminator() {
        let output = parse("let a = 1 & 2\nlet b = 1 2");
        let messages: Vec<_> = output.diagnostics.iter().map(|d| d.message.clone()).collect();
        assert!(messages.iter().any(|m| m.contains("illegal token '&'")), "{messages:?}");
        assert!(messages.iter().any(|m| m.contains("expected newline or ';'")), "{messages:?}");
    }

    #[test]
    fn rejects_invalid_assignment_target() {
        let output = parse("f() = 3");
        assert_eq!(output.diagnostics[0].code, Some("E0108"));
    }

    #[test]
    fn reparsing_canonical_output_preserves_shape() {
        let source = "import { println } from \"std/fmt\"\nfn main() {\n    mut i = 0\n    let big = 10000000000000000.0\n    let doc = { name: \"x\", \"list\": [1, big, -2] }\n    while i < 3 && !done(i) {\n        i = i + 1 * 2\n    }\n    println(\"i=\", -i, doc)\n}\n";
        let first = parse_ok(source);
        let second = parse_ok(&first.to_string());
        assert_eq!(first.to_string(), second.to_string());
    }
}
