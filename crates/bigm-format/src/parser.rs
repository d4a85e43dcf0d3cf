use bigm_solver::{ConstraintOp, LpProblem, Reference};
use log::debug;
use thiserror::Error;

use crate::lexer::{Lexer, Span, Token, TokenKind};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token on line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        span: Span,
    },
    #[error("Unexpected end of file: expected {expected}")]
    UnexpectedEof { expected: String },
    #[error("Invalid number on line {line}: {text}")]
    InvalidNumber { text: String, line: usize },
    #[error("Row on line {line} has {found} coefficients, expected {expected}")]
    RowLength { line: usize, expected: usize, found: usize },
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
}

impl ParseError {
    /// Line the error points at, when there is one
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::UnexpectedToken { line, .. }
            | ParseError::InvalidNumber { line, .. }
            | ParseError::RowLength { line, .. } => Some(*line),
            ParseError::UnexpectedEof { .. } | ParseError::InvalidDimensions(_) => None,
        }
    }
}

/// One constraint row as written in the input file
#[derive(Debug, Clone, PartialEq)]
pub struct InputRow {
    pub coefficients: Vec<f64>,
    pub op: ConstraintOp,
    pub rhs: f64,
    pub line: usize,
}

/// A parsed LP input file
#[derive(Debug, Clone, PartialEq)]
pub struct LpInput {
    pub minimize: bool,
    pub objective: Vec<f64>,
    pub rows: Vec<InputRow>,
}

impl LpInput {
    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.rows.len()
    }

    pub fn to_problem(&self) -> LpProblem {
        let mut problem = LpProblem::with_dimension(self.num_variables());
        problem.set_objective(self.objective.clone(), self.minimize);
        for (i, row) in self.rows.iter().enumerate() {
            problem.add_constraint(format!("r{}", i + 1), row.coefficients.clone(), row.op, row.rhs);
        }
        problem
    }
}

/// Largest row or variable count accepted in a file header
pub const MAX_DIMENSION: usize = u32::MAX as usize;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Parse an LP input file.
///
/// ```text
/// n m                  # n constraint rows, m variables
/// [max|min] c1 ... cm
/// a11 ... a1m [<=|>=|=] b1
/// ```
///
/// A row without a relation is an equality.
pub fn parse_input(source: &str) -> Result<LpInput, ParseError> {
    Parser::new(Lexer::tokenize(source)).parse_input()
}

/// Parse a reference solution: the objective value on the first line and the
/// solution vector on the second.
pub fn parse_reference(source: &str) -> Result<Reference, ParseError> {
    Parser::new(Lexer::tokenize(source)).parse_reference()
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn skip_comments(&mut self) {
        while self.peek_kind() == TokenKind::Comment {
            self.advance();
        }
    }

    fn skip_blank_lines(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Comment) {
            self.advance();
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(t) if t.kind != TokenKind::Eof => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: match t.kind {
                    TokenKind::Newline => "end of line".to_string(),
                    _ => format!("'{}'", t.text),
                },
                line: t.line,
                span: t.span,
            },
            _ => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    /// Line of the next meaningful token
    fn line(&self) -> usize {
        self.current().map(|t| t.line).unwrap_or(0)
    }

    fn end_line(&mut self) -> Result<(), ParseError> {
        self.skip_comments();
        match self.peek_kind() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of line")),
        }
    }

    fn number(&mut self, expected: &str) -> Result<f64, ParseError> {
        self.skip_comments();
        if self.peek_kind() != TokenKind::Number {
            return Err(self.unexpected(expected));
        }
        let token = self.advance().cloned().ok_or_else(|| ParseError::UnexpectedEof {
            expected: expected.to_string(),
        })?;
        token
            .text
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or(ParseError::InvalidNumber {
                text: token.text,
                line: token.line,
            })
    }

    fn numbers(&mut self) -> Result<Vec<f64>, ParseError> {
        let mut values = Vec::new();
        self.skip_comments();
        while self.peek_kind() == TokenKind::Number {
            values.push(self.number("number")?);
            self.skip_comments();
        }
        Ok(values)
    }

    fn dimension(&mut self, what: &str) -> Result<usize, ParseError> {
        let value = self.number(what)?;
        if value < 0.0 || value.fract() != 0.0 {
            return Err(ParseError::InvalidDimensions(format!("{} must be a non-negative integer, got {}", what, value)));
        }
        if value > MAX_DIMENSION as f64 {
            return Err(ParseError::InvalidDimensions(format!("{} is too large: {}", what, value)));
        }
        Ok(value as usize)
    }

    pub fn parse_input(&mut self) -> Result<LpInput, ParseError> {
        self.skip_blank_lines();
        let n = self.dimension("number of constraints")?;
        let m = self.dimension("number of variables")?;
        if m == 0 {
            return Err(ParseError::InvalidDimensions("an LP needs at least one variable".to_string()));
        }
        self.end_line()?;

        self.skip_blank_lines();
        let minimize = match self.peek_kind() {
            TokenKind::Max => {
                self.advance();
                false
            }
            TokenKind::Min => {
                self.advance();
                true
            }
            _ => true,
        };
        let line = self.line();
        let objective = self.numbers()?;
        if objective.len() != m {
            if objective.is_empty() {
                return Err(self.unexpected("objective coefficients"));
            }
            return Err(ParseError::RowLength {
                line,
                expected: m,
                found: objective.len(),
            });
        }
        self.end_line()?;

        let mut rows = Vec::new();
        for _ in 0..n {
            self.skip_blank_lines();
            rows.push(self.parse_row(m)?);
        }

        self.skip_blank_lines();
        if self.peek_kind() != TokenKind::Eof {
            return Err(self.unexpected("end of file"));
        }

        debug!("parsed LP input: {} constraints, {} variables", n, m);
        Ok(LpInput {
            minimize,
            objective,
            rows,
        })
    }

    fn parse_row(&mut self, m: usize) -> Result<InputRow, ParseError> {
        let line = self.line();
        let mut coefficients = self.numbers()?;

        let op = match self.peek_kind() {
            TokenKind::Le => Some(ConstraintOp::Le),
            TokenKind::Ge => Some(ConstraintOp::Ge),
            TokenKind::Eq => Some(ConstraintOp::Eq),
            _ => None,
        };
        let (op, rhs) = match op {
            Some(op) => {
                self.advance();
                (op, self.number("right-hand side")?)
            }
            None => match coefficients.pop() {
                Some(rhs) => (ConstraintOp::Eq, rhs),
                None => return Err(self.unexpected("constraint row")),
            },
        };

        if coefficients.len() != m {
            return Err(ParseError::RowLength {
                line,
                expected: m,
                found: coefficients.len(),
            });
        }
        self.end_line()?;

        Ok(InputRow {
            coefficients,
            op,
            rhs,
            line,
        })
    }

    pub fn parse_reference(&mut self) -> Result<Reference, ParseError> {
        self.skip_blank_lines();
        let objective = self.number("objective value")?;
        self.end_line()?;

        self.skip_blank_lines();
        let values = self.numbers()?;
        if values.is_empty() {
            return Err(self.unexpected("solution vector"));
        }
        self.end_line()?;

        self.skip_blank_lines();
        if self.peek_kind() != TokenKind::Eof {
            return Err(self.unexpected("end of file"));
        }
        Ok(Reference { objective, values })
    }
}
