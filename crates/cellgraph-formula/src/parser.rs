//! Formula parser
//!
//! A recursive descent parser for spreadsheet formulas with proper operator precedence.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator, MAX_EXPR_DEPTH};
use crate::error::{FormulaError, FormulaResult};
use cellgraph_core::{CellAddress, CellError, CellRange};

/// Deepest nesting of parentheses, function calls and prefix operators
const MAX_NESTING: usize = 64;

/// Parse a formula string into an AST
///
/// Formulas nested deeper than the parser allows are rejected with
/// [`FormulaError::Parse`] rather than exhausting the stack.
///
/// # Example
/// ```rust
/// use cellgraph_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("=SUM(A1:A10)").unwrap();
/// let ast = parse_formula("=IF(A1>0,\"Yes\",\"No\")").unwrap();
/// assert!(parse_formula("=(1+2").is_err());
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let formula = formula.trim();

    // Formula must start with '='
    let formula = formula
        .strip_prefix('=')
        .ok_or_else(|| FormulaError::Parse("Formula must start with '='".into()))?;

    parse_expression_text(formula)
}

/// Parse expression text that has already had its leading `=` removed
pub fn parse_expression_text(text: &str) -> FormulaResult<FormulaExpr> {
    let mut parser = FormulaParser::new(text);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected {} after expression",
            parser.current_token().describe()
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),

    // Identifiers and references
    Identifier(String), // Function name or bare name
    CellRef(String),    // Cell reference like A1, $A$1

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,

    // Text the scanner could not tokenize
    Invalid(String),

    // End of input
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Eof => "end of formula".to_string(),
            Token::Invalid(text) => format!("'{}'", text),
            other => format!("{:?}", other),
        }
    }
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Token,
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: Token::Eof,
            depth: 0,
        };
        parser.advance_token();
        parser
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.current_token = self.scan_token();
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let Some(c) = self.peek_char() else {
            return Token::Eof;
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '%' => Some(Token::Percent),
            '&' => Some(Token::Ampersand),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '=' => Some(Token::Equal),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return token;
        }

        // Two-character operators
        if c == '<' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Token::LessEqual;
            } else if self.peek_char() == Some('>') {
                self.advance();
                return Token::NotEqual;
            }
            return Token::LessThan;
        }

        if c == '>' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Token::GreaterEqual;
            }
            return Token::GreaterThan;
        }

        // String literal
        if c == '"' {
            return self.scan_string();
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        // Identifier, cell reference, or boolean/error
        if c.is_ascii_alphabetic() || c == '_' || c == '$' || c == '#' {
            return self.scan_identifier_or_ref();
        }

        // Unknown character
        self.advance();
        Token::Invalid(c.to_string())
    }

    fn scan_string(&mut self) -> Token {
        self.advance(); // Skip opening quote

        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c == '"' {
                // Check for escaped quote ("")
                if self.peek_char_at(1) == Some('"') {
                    s.push('"');
                    self.advance();
                    self.advance();
                } else {
                    self.advance(); // Skip closing quote
                    return Token::String(s);
                }
            } else {
                s.push(c);
                self.advance();
            }
        }

        Token::Invalid(format!("\"{}", s))
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        match num_str.parse::<f64>() {
            Ok(num) => Token::Number(num),
            Err(_) => Token::Invalid(num_str.to_string()),
        }
    }

    fn scan_identifier_or_ref(&mut self) -> Token {
        // Check for error values first (#DIV/0!, #REF!, etc.)
        if self.peek_char() == Some('#') {
            let start = self.pos;
            self.advance();
            while self.peek_char().map_or(false, |c| {
                c.is_ascii_alphanumeric() || c == '!' || c == '/' || c == '?' || c == '_'
            }) {
                self.advance();
            }
            let error_str = &self.input[start..self.pos];
            return match CellError::from_str(error_str) {
                Some(err) => Token::Error(err),
                None => Token::Invalid(error_str.to_string()),
            };
        }

        let start = self.pos;

        // Scan identifier/reference
        while self.peek_char().map_or(false, |c| {
            c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'
        }) {
            self.advance();
        }

        let text = &self.input[start..self.pos];
        let followed_by_paren = self.peek_non_whitespace() == Some('(');

        // Check for boolean literals (but not if followed by '(' - then it's a function call)
        let upper = text.to_uppercase();
        if upper == "TRUE" && !followed_by_paren {
            return Token::Boolean(true);
        }
        if upper == "FALSE" && !followed_by_paren {
            return Token::Boolean(false);
        }

        // Letters followed by digits is a cell reference, unless it is called
        // like a function (LOG10(100))
        if Self::is_cell_reference(text) && !followed_by_paren {
            return Token::CellRef(text.to_string());
        }

        Token::Identifier(text.to_string())
    }

    fn is_cell_reference(text: &str) -> bool {
        // Pattern: [$]letters[$]digits
        let bytes = text.as_bytes();
        let mut i = 0;

        if bytes.get(i) == Some(&b'$') {
            i += 1;
        }

        let letter_start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
            i += 1;
        }
        if i == letter_start {
            return false;
        }

        if bytes.get(i) == Some(&b'$') {
            i += 1;
        }

        let digit_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == digit_start {
            return false;
        }

        // Must have consumed everything
        i == bytes.len()
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn peek_non_whitespace(&self) -> Option<char> {
        self.input[self.pos..].chars().find(|c| !c.is_whitespace())
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        &self.current_token
    }

    fn consume(&mut self) -> Token {
        let token = std::mem::replace(&mut self.current_token, Token::Eof);
        self.advance_token();
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {}",
                expected,
                self.current_token().describe()
            )))
        }
    }

    /// Step one nesting level down, failing past `MAX_NESTING`
    fn enter(&mut self) -> FormulaResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(FormulaError::Parse(format!(
                "Formula is nested more than {} levels deep",
                MAX_NESTING
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Run `parse` one nesting level down
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> FormulaResult<T>,
    ) -> FormulaResult<T> {
        self.enter()?;
        let result = parse(self);
        self.leave();
        result
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Concatenation: &
    // 3. Addition/Subtraction: +, -
    // 4. Multiplication/Division: *, /
    // 5. Exponentiation: ^
    // 6. Unary: -, %
    // 7. Range: :
    // 8. Primary: literals, references, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.nested(Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_concatenation()?;

        loop {
            let op = match self.current_token() {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume();
            let right = self.parse_concatenation()?;
            left = binary(op, left, right)?;
        }

        Ok(left)
    }

    fn parse_concatenation(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_additive()?;

        while matches!(self.current_token(), Token::Ampersand) {
            self.consume();
            let right = self.parse_additive()?;
            left = binary(BinaryOperator::Concat, left, right)?;
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right)?;
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_exponent()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_exponent()?;
            left = binary(op, left, right)?;
        }

        Ok(left)
    }

    fn parse_exponent(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_unary()?;

        if matches!(self.current_token(), Token::Caret) {
            self.consume();
            let right = self.nested(Self::parse_exponent)?; // Right associative
            return binary(BinaryOperator::Power, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        // Prefix unary minus
        if matches!(self.current_token(), Token::Minus) {
            self.consume();
            let operand = self.nested(Self::parse_unary)?;
            return unary(UnaryOperator::Negate, operand);
        }

        // Prefix plus (no-op)
        if matches!(self.current_token(), Token::Plus) {
            self.consume();
            return self.nested(Self::parse_unary);
        }

        // Parse primary, then check for postfix percent
        let mut expr = self.parse_range()?;

        while matches!(self.current_token(), Token::Percent) {
            self.consume();
            expr = unary(UnaryOperator::Percent, expr)?;
        }

        Ok(expr)
    }

    fn parse_range(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;

        if !matches!(self.current_token(), Token::Colon) {
            return Ok(left);
        }
        self.consume();
        let right = self.parse_primary()?;

        match (left, right) {
            (FormulaExpr::CellRef(start), FormulaExpr::CellRef(end)) => {
                Ok(FormulaExpr::RangeRef(CellRange::new(start, end)))
            }
            // An endpoint that was not a valid address
            (FormulaExpr::Error(CellError::Ref), _) | (_, FormulaExpr::Error(CellError::Ref)) => {
                Ok(FormulaExpr::Error(CellError::Ref))
            }
            _ => Err(FormulaError::Parse(
                "Range operator ':' requires cell references on both sides".into(),
            )),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.consume() {
            Token::Number(n) => Ok(FormulaExpr::Number(n)),
            Token::String(s) => Ok(FormulaExpr::String(s)),
            Token::Boolean(b) => Ok(FormulaExpr::Boolean(b)),
            Token::Error(e) => Ok(FormulaExpr::Error(e)),

            Token::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::CellRef(ref_str) => Ok(Self::parse_cell_reference(&ref_str)),

            Token::Identifier(name) => {
                // Check if it's a function call
                if matches!(self.current_token(), Token::LeftParen) {
                    self.parse_function_call(name)
                } else {
                    Ok(FormulaExpr::NameRef(name))
                }
            }

            other => Err(FormulaError::Parse(format!(
                "Unexpected {}",
                other.describe()
            ))),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        // Parse arguments
        if !matches!(self.current_token(), Token::RightParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume();
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&Token::RightParen)?;

        within_depth(FormulaExpr::Function {
            name: name.to_uppercase(),
            args,
        })
    }

    /// Normalize a reference token (`$` markers stripped, letters uppercased) and
    /// resolve it. Text shaped like a reference that is not a valid address (row 0,
    /// overflowing indices) becomes a `#REF!` literal.
    fn parse_cell_reference(ref_str: &str) -> FormulaExpr {
        let clean_ref = ref_str.replace('$', "").to_ascii_uppercase();
        match CellAddress::parse(&clean_ref) {
            Ok(address) => FormulaExpr::CellRef(address),
            Err(e) => {
                log::trace!("Reference '{}' is not a valid address: {}", ref_str, e);
                FormulaExpr::Error(CellError::Ref)
            }
        }
    }
}

fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaResult<FormulaExpr> {
    within_depth(FormulaExpr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn unary(op: UnaryOperator, operand: FormulaExpr) -> FormulaResult<FormulaExpr> {
    within_depth(FormulaExpr::UnaryOp {
        op,
        operand: Box::new(operand),
    })
}

/// Reject trees too deep to evaluate (long operator chains build them
/// without nesting)
fn within_depth(expr: FormulaExpr) -> FormulaResult<FormulaExpr> {
    if expr.depth() > MAX_EXPR_DEPTH {
        return Err(FormulaError::Parse(format!(
            "Formula is more than {} operations deep",
            MAX_EXPR_DEPTH
        )));
    }
    Ok(expr)
}
