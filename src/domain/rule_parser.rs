//! Strategy DSL parser.
//!
//! Recursive descent over the token stream produced by [`lexer::tokenize`].
//! Grammar, lowest to highest precedence:
//!
//! ```text
//! strategy   := (ENTRY ':' condition)? (EXIT ':' condition)?   -- either order, at least one
//! condition  := term (OR term)*
//! term       := factor (AND factor)*
//! factor     := '(' condition ')' | comparison
//! comparison := operand OP operand | cross
//! cross      := (CROSS | CROSSOVER | CROSSUNDER) '(' operand ',' operand ')'
//! operand    := NUMBER | IDENT | IDENT '(' operand (',' operand)* ')'
//! ```
//!
//! A run of one operator (`a AND b AND c`) is collected into a single flat
//! `Condition::Logical`, read left to right; AND binds tighter than OR. A bare
//! `CROSS` is treated as `CROSSOVER`. Errors carry the byte offset, the set of
//! tokens that would have been accepted, and a description of what was found.
//! A failed parse never yields a partial tree.

use crate::domain::error::{CompileError, ParseError};
use crate::domain::lexer;
use crate::domain::rule::{
    Clause, Condition, CrossDirection, IndicatorCall, LogicalOp, Operand, Strategy,
};
use crate::domain::token::{Keyword, Token, TokenKind};

/// Maximum nesting of parentheses and indicator calls.
pub const MAX_NESTING: usize = 128;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    fn error(&self, expected: &[&str]) -> ParseError {
        let token = self.current();
        ParseError::new(token.position, expected, token.describe())
    }

    fn expect(&mut self, kind: TokenKind, label: &str) -> Result<Token, ParseError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error(&[label]))
        }
    }

    fn expect_close(&mut self, open: &Token) -> Result<(), ParseError> {
        if self.check(&TokenKind::RParen) {
            self.advance();
            return Ok(());
        }
        let token = self.current();
        Err(ParseError {
            message: format!(
                "unclosed '(' at position {}: expected ')', found {}",
                open.position,
                token.describe()
            ),
            position: token.position,
            expected: vec!["')'".to_string()],
            found: token.describe(),
        })
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            let token = self.current();
            return Err(ParseError::custom(
                token.position,
                format!("nesting deeper than {} levels", MAX_NESTING),
                token.describe(),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_strategy(&mut self) -> Result<Strategy, ParseError> {
        let mut strategy = Strategy {
            entry: None,
            exit: None,
        };

        loop {
            let token = self.current().clone();
            let clause = match token.kind {
                TokenKind::Keyword(Keyword::Entry) => Clause::Entry,
                TokenKind::Keyword(Keyword::Exit) => Clause::Exit,
                TokenKind::Eof => break,
                TokenKind::RParen => {
                    return Err(ParseError::custom(
                        token.position,
                        "unmatched ')'",
                        token.describe(),
                    ));
                }
                _ if strategy.entry.is_none() && strategy.exit.is_none() => {
                    return Err(self.error(&["ENTRY", "EXIT"]));
                }
                _ => return Err(self.error(&["AND", "OR", "ENTRY", "EXIT", "end of input"])),
            };

            let slot = match clause {
                Clause::Entry => &strategy.entry,
                Clause::Exit => &strategy.exit,
            };
            if slot.is_some() {
                return Err(ParseError::custom(
                    token.position,
                    format!("duplicate {} clause", clause),
                    token.describe(),
                ));
            }

            self.advance();
            self.expect(TokenKind::Colon, "':'")?;
            let condition = self.parse_condition()?;
            match clause {
                Clause::Entry => strategy.entry = Some(condition),
                Clause::Exit => strategy.exit = Some(condition),
            }
        }

        if strategy.entry.is_none() && strategy.exit.is_none() {
            let token = self.current();
            return Err(ParseError {
                message: format!(
                    "strategy needs an ENTRY or EXIT clause, found {}",
                    token.describe()
                ),
                position: token.position,
                expected: vec!["ENTRY".to_string(), "EXIT".to_string()],
                found: token.describe(),
            });
        }
        Ok(strategy)
    }

    fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        let mut left = self.parse_term()?;
        while self.current().kind == TokenKind::Logical(LogicalOp::Or) {
            self.advance();
            let right = self.parse_term()?;
            left = Condition::or(left, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Condition, ParseError> {
        let mut left = self.parse_factor()?;
        while self.current().kind == TokenKind::Logical(LogicalOp::And) {
            self.advance();
            let right = self.parse_factor()?;
            left = Condition::and(left, right);
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Condition, ParseError> {
        if self.check(&TokenKind::LParen) {
            let open = self.advance();
            self.enter()?;
            let condition = self.parse_condition()?;
            self.expect_close(&open)?;
            self.leave();
            return Ok(condition);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Condition, ParseError> {
        match self.current().kind {
            TokenKind::Keyword(Keyword::Cross) => self.parse_cross(CrossDirection::Over),
            TokenKind::Keyword(Keyword::CrossDirectional(direction)) => {
                self.parse_cross(direction)
            }
            TokenKind::Number(_) | TokenKind::Ident(_) => {
                let left = self.parse_operand()?;
                let op = match self.current().kind {
                    TokenKind::Op(op) => {
                        self.advance();
                        op
                    }
                    _ => return Err(self.error(&["comparison operator"])),
                };
                let right = self.parse_operand()?;
                Ok(Condition::Comparison { op, left, right })
            }
            _ => Err(self.error(&["'('", "CROSS", "CROSSOVER", "CROSSUNDER", "number", "identifier"])),
        }
    }

    fn parse_cross(&mut self, direction: CrossDirection) -> Result<Condition, ParseError> {
        self.advance();
        let open = self.expect(TokenKind::LParen, "'('")?;
        let left = self.parse_operand()?;
        self.expect(TokenKind::Comma, "','")?;
        let right = self.parse_operand()?;
        self.expect_close(&open)?;
        Ok(Condition::Cross {
            direction,
            left,
            right,
        })
    }

    fn parse_operand(&mut self) -> Result<Operand, ParseError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Number(value) => {
                self.advance();
                Ok(Operand::Literal(value))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    let call = self.parse_call(name, token.position)?;
                    Ok(Operand::Indicator(call))
                } else {
                    Ok(Operand::Field {
                        name,
                        position: token.position,
                    })
                }
            }
            _ => Err(self.error(&["number", "identifier"])),
        }
    }

    fn parse_call(&mut self, name: String, position: usize) -> Result<IndicatorCall, ParseError> {
        let open = self.advance();
        self.enter()?;

        let mut args = vec![self.parse_operand()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            args.push(self.parse_operand()?);
        }
        self.expect_close(&open)?;
        self.leave();

        Ok(IndicatorCall {
            name: name.to_ascii_uppercase(),
            args,
            position,
        })
    }
}

/// Parse a token stream (as produced by [`lexer::tokenize`]) into a strategy.
pub fn parse_tokens(tokens: Vec<Token>) -> Result<Strategy, ParseError> {
    let mut parser = Parser::new(tokens);
    parser.parse_strategy()
}

/// Parse a complete strategy document (`ENTRY: ...` / `EXIT: ...`).
pub fn parse(input: &str) -> Result<Strategy, CompileError> {
    let tokens = lexer::tokenize(input)?;
    Ok(parse_tokens(tokens)?)
}

/// Parse the text of a single clause body, without the `ENTRY:`/`EXIT:` header.
pub fn parse_condition(input: &str) -> Result<Condition, CompileError> {
    let tokens = lexer::tokenize(input)?;
    let mut parser = Parser::new(tokens);
    let condition = parser.parse_condition()?;
    match parser.current().kind {
        TokenKind::Eof => Ok(condition),
        TokenKind::RParen => {
            let token = parser.current();
            Err(ParseError::custom(token.position, "unmatched ')'", token.describe()).into())
        }
        _ => Err(parser.error(&["AND", "OR", "end of input"]).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rule::CompareOp;

    fn parse_ok(input: &str) -> Strategy {
        parse(input).unwrap()
    }

    fn parse_err(input: &str) -> ParseError {
        match parse(input).unwrap_err() {
            CompileError::Parse(e) => e,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn parse_entry_comparison() {
        let s = parse_ok("ENTRY: close > 100");
        assert!(s.exit.is_none());
        match s.entry.unwrap() {
            Condition::Comparison { op, left, right } => {
                assert_eq!(op, CompareOp::Gt);
                assert!(matches!(left, Operand::Field { ref name, position: 7 } if name == "close"));
                assert_eq!(right, Operand::Literal(100.0));
            }
            other => panic!("expected comparison, got {other:?}"),
        }
    }

    #[test]
    fn parse_entry_and_exit() {
        let s = parse_ok("ENTRY: close > SMA(close, 2)\nEXIT: close < SMA(close, 2)");
        assert!(s.entry.is_some());
        assert!(s.exit.is_some());
    }

    #[test]
    fn clause_order_is_insensitive() {
        let a = parse_ok("ENTRY: close > 1 EXIT: close < 1");
        let b = parse_ok("EXIT: close < 1 ENTRY: close > 1");
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn exit_only_strategy() {
        let s = parse_ok("EXIT: RSI(close, 14) > 70");
        assert!(s.entry.is_none());
        assert!(s.exit.is_some());
    }

    #[test]
    fn lowercase_keywords_and_indicators() {
        let s = parse_ok("entry: sma(close, 20) > 1 and close > 2");
        match s.entry.unwrap() {
            Condition::Logical {
                op: LogicalOp::And,
                operands,
            } => match &operands[0] {
                Condition::Comparison {
                    left: Operand::Indicator(call),
                    ..
                } => assert_eq!(call.name, "SMA"),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let implicit = parse_ok("ENTRY: close > 1 OR close > 2 AND close > 3");
        let explicit = parse_ok("ENTRY: close > 1 OR (close > 2 AND close > 3)");
        assert_eq!(implicit.to_string(), explicit.to_string());
        match implicit.entry.unwrap() {
            Condition::Logical {
                op: LogicalOp::Or,
                operands,
            } => assert!(matches!(
                operands.as_slice(),
                [
                    Condition::Comparison { .. },
                    Condition::Logical {
                        op: LogicalOp::And,
                        ..
                    }
                ]
            )),
            other => panic!("expected OR at root, got {other:?}"),
        }
    }

    #[test]
    fn parentheses_override_precedence() {
        let s = parse_ok("ENTRY: (close > 1 OR close > 2) AND close > 3");
        assert!(matches!(
            s.entry.unwrap(),
            Condition::Logical {
                op: LogicalOp::And,
                ..
            }
        ));
    }

    #[test]
    fn chains_collect_into_one_run() {
        let s = parse_ok("ENTRY: close > 1 AND close > 2 AND close > 3");
        assert_eq!(s.to_string(), "ENTRY: (close > 1 AND close > 2 AND close > 3)");
        let s = parse_ok("ENTRY: close > 1 OR close > 2 OR close > 3");
        assert_eq!(s.to_string(), "ENTRY: (close > 1 OR close > 2 OR close > 3)");
    }

    #[test]
    fn long_chain_stays_flat() {
        let text = format!("ENTRY: close > 0{}", " AND close > 0".repeat(50_000));
        match parse_ok(&text).entry.unwrap() {
            Condition::Logical {
                op: LogicalOp::And,
                operands,
            } => assert_eq!(operands.len(), 50_001),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn nested_indicator_calls() {
        let s = parse_ok("ENTRY: SMA(RSI(close, 14), 5) > 50");
        match s.entry.unwrap() {
            Condition::Comparison {
                left: Operand::Indicator(outer),
                ..
            } => {
                assert_eq!(outer.name, "SMA");
                assert_eq!(outer.args.len(), 2);
                assert!(matches!(&outer.args[0], Operand::Indicator(inner) if inner.name == "RSI"));
                assert_eq!(outer.args[1], Operand::Literal(5.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cross_forms() {
        let over = parse_ok("ENTRY: CROSSOVER(SMA(close, 10), SMA(close, 30))");
        assert!(matches!(
            over.entry.unwrap(),
            Condition::Cross {
                direction: CrossDirection::Over,
                ..
            }
        ));

        let under = parse_ok("EXIT: CROSSUNDER(close, 100)");
        assert!(matches!(
            under.exit.unwrap(),
            Condition::Cross {
                direction: CrossDirection::Under,
                ..
            }
        ));

        let bare = parse_ok("ENTRY: CROSS(close, 100)");
        assert!(matches!(
            bare.entry.unwrap(),
            Condition::Cross {
                direction: CrossDirection::Over,
                ..
            }
        ));

        let alias = parse_ok("EXIT: cross_below(close, open)");
        assert!(matches!(
            alias.exit.unwrap(),
            Condition::Cross {
                direction: CrossDirection::Under,
                ..
            }
        ));
    }

    #[test]
    fn cross_inside_logical_expression() {
        let s = parse_ok("ENTRY: CROSSOVER(close, SMA(close, 5)) AND volume > 1000");
        assert_eq!(
            s.to_string(),
            "ENTRY: (CROSSOVER(close, SMA(close, 5)) AND volume > 1000)"
        );
    }

    #[test]
    fn display_round_trips() {
        let input = "ENTRY: (CROSS(SMA(close,10), SMA(close,30)) or close >= 1.5) and rsi(close,14) < 30\nEXIT: close == 2";
        let first = parse_ok(input);
        let second = parse_ok(&first.to_string());
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn parsing_twice_is_structurally_equal() {
        let input = "ENTRY: close > SMA(close, 20) AND RSI(close, 14) < 30 EXIT: CROSSUNDER(close, SMA(close, 20))";
        assert_eq!(parse_ok(input), parse_ok(input));
    }

    #[test]
    fn literal_on_both_sides() {
        let s = parse_ok("ENTRY: 1 < 2");
        assert!(matches!(
            s.entry.unwrap(),
            Condition::Comparison {
                left: Operand::Literal(_),
                right: Operand::Literal(_),
                ..
            }
        ));
    }

    #[test]
    fn parse_condition_without_header() {
        let cond = parse_condition("close > 1 AND close < 5").unwrap();
        assert!(matches!(
            cond,
            Condition::Logical {
                op: LogicalOp::And,
                ..
            }
        ));
    }

    #[test]
    fn error_empty_input() {
        let err = parse_err("");
        assert_eq!(err.position, 0);
        assert_eq!(err.expected, vec!["ENTRY", "EXIT"]);
        assert_eq!(err.found, "end of input");
    }

    #[test]
    fn error_missing_colon() {
        let err = parse_err("ENTRY close > 1");
        assert_eq!(err.position, 6);
        assert_eq!(err.expected, vec!["':'"]);
    }

    #[test]
    fn error_duplicate_clause() {
        let err = parse_err("ENTRY: close > 1 ENTRY: close > 2");
        assert!(err.message.contains("duplicate ENTRY clause"));
        assert_eq!(err.position, 17);
    }

    #[test]
    fn error_unclosed_paren() {
        let err = parse_err("ENTRY: (close > 1 AND close > 2");
        assert!(err.message.contains("unclosed '(' at position 7"));
        assert_eq!(err.expected, vec!["')'"]);
        assert_eq!(err.found, "end of input");
    }

    #[test]
    fn error_unmatched_close_paren() {
        let err = parse_err("ENTRY: close > 1)");
        assert!(err.message.contains("unmatched ')'"));
        assert_eq!(err.position, 16);
    }

    #[test]
    fn error_unclosed_indicator_call() {
        let err = parse_err("ENTRY: close > SMA(close, 20");
        assert!(err.message.contains("unclosed '(' at position 18"));
    }

    #[test]
    fn error_keyword_used_as_column() {
        let err = parse_err("ENTRY: AND > 5");
        assert_eq!(err.position, 7);
        assert_eq!(err.found, "AND");
        assert!(err.expected.contains(&"identifier".to_string()));
    }

    #[test]
    fn error_keyword_used_as_argument() {
        let err = parse_err("ENTRY: SMA(EXIT, 5) > 1");
        assert_eq!(err.position, 11);
        assert_eq!(err.expected, vec!["number", "identifier"]);
    }

    #[test]
    fn error_missing_operator() {
        let err = parse_err("ENTRY: close 100");
        assert_eq!(err.expected, vec!["comparison operator"]);
        assert_eq!(err.found, "number 100");
    }

    #[test]
    fn error_trailing_tokens() {
        let err = parse_err("ENTRY: close > 1 close");
        assert!(err.expected.contains(&"AND".to_string()));
        assert!(err.expected.contains(&"end of input".to_string()));
    }

    #[test]
    fn error_empty_call() {
        let err = parse_err("ENTRY: SMA() > 1");
        assert_eq!(err.found, "')'");
    }

    #[test]
    fn error_cross_with_three_arguments() {
        let err = parse_err("ENTRY: CROSS(close, open, high)");
        assert_eq!(err.expected, vec!["')'"]);
        assert_eq!(err.found, "','");
    }

    #[test]
    fn error_comparison_of_crosses() {
        let err = parse_err("ENTRY: CROSSOVER(close, open) > 1");
        assert!(err.expected.contains(&"OR".to_string()));
    }

    #[test]
    fn lex_errors_surface_through_parse() {
        let err = parse("ENTRY: close > 1.").unwrap_err();
        assert!(matches!(err, CompileError::Lex(_)));
    }

    #[test]
    fn error_nesting_too_deep() {
        let mut input = String::from("ENTRY: ");
        for _ in 0..(MAX_NESTING + 1) {
            input.push('(');
        }
        input.push_str("close > 1");
        let err = parse_err(&input);
        assert!(err.message.contains("nesting deeper"));
    }

    #[test]
    fn error_display_with_context() {
        let input = "ENTRY: close > SMA(close, 20";
        let err = parse(input).unwrap_err();
        let ctx = err.display_with_context(input);
        assert!(ctx.contains('^'));
        assert!(ctx.contains("position"));
    }
}
