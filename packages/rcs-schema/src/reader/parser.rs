//! Recursive-descent parser over the token list.
//!
//! ```text
//! schema       := decl*
//! decl         := resourceDecl | dataDecl | enumDecl
//! resourceDecl := "resource" IDENT fieldBlock
//! dataDecl     := "data" IDENT fieldBlock
//! enumDecl     := "enum" IDENT "{" IDENT ("," IDENT)* ","? "}"
//! fieldBlock   := "{" (TYPE IDENT ";")* "}"
//! ```
//!
//! Parsing stops at the first error; the schema under construction is
//! dropped with it.

use crate::error::{AtLine, Result, SchemaError};
use crate::model::{is_identifier, FieldSet, FieldSetKind, Schema, SchemaBuilder};
use crate::reader::tokenizer::Token;

/// Text reported as the found token when input runs out.
pub const EOF: &str = "<EOF>";

const EXPECT_DECLARATION: &str = "<DECLARATION>";
const EXPECT_IDENTIFIER: &str = "<IDENTIFIER>";
const EXPECT_TYPE: &str = "<TYPE>";

/// Token cursor plus the open schema being filled in.
struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    builder: SchemaBuilder,
}

/// Parses a token list into a closed schema named `name`.
pub fn parse(name: &str, tokens: &[Token]) -> Result<Schema> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        builder: SchemaBuilder::new(name),
    };

    parser.declare_resources();

    while let Some(token) = parser.next() {
        match token.text.as_str() {
            "resource" => parser.parse_resource()?,
            "data" => parser.parse_data()?,
            "enum" => parser.parse_enum()?,
            _ => return Err(syntax(token, EXPECT_DECLARATION)),
        }
    }

    let last_line = tokens.last().map_or(1, |t| t.line);
    parser.builder.finish().at_line(last_line)
}

impl<'t> Parser<'t> {
    /// Token the cursor was last advanced past.
    fn current(&self) -> Option<&'t Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Next token, or a syntax error naming `expected`.
    ///
    /// Inside a brace block the error points at the line of the opening
    /// brace, which is the one left unmatched.
    fn next_or_eof(&mut self, expected: &str, open_line: Option<u32>) -> Result<&'t Token> {
        match self.next() {
            Some(token) => Ok(token),
            None => Err(SchemaError::Syntax {
                line: open_line
                    .or_else(|| self.current().map(|t| t.line))
                    .unwrap_or(1),
                found: EOF.to_string(),
                expected: expected.to_string(),
            }),
        }
    }

    fn expect(&mut self, text: &str, open_line: Option<u32>) -> Result<&'t Token> {
        let token = self.next_or_eof(text, open_line)?;
        if token.text != text {
            return Err(syntax(token, text));
        }
        Ok(token)
    }

    fn expect_identifier(&mut self, open_line: Option<u32>) -> Result<&'t Token> {
        let token = self.next_or_eof(EXPECT_IDENTIFIER, open_line)?;
        if !is_identifier(&token.text) {
            return Err(syntax(token, EXPECT_IDENTIFIER));
        }
        Ok(token)
    }

    /// Declares every `resource NAME {` up front so fields may refer to
    /// resources defined later in the file.
    ///
    /// Nothing is reported here. A name that cannot be declared fails again
    /// in [`Parser::parse_resource`], at its definition.
    fn declare_resources(&mut self) {
        for window in self.tokens.windows(3) {
            let [keyword, name, open] = window else {
                continue;
            };
            if keyword.text == "resource" && open.text == "{" && is_identifier(&name.text) {
                if let Err(err) = self.builder.declare_resource(&name.text) {
                    tracing::trace!("Deferred resource '{}': {}", name.text, err);
                }
            }
        }
    }

    fn parse_resource(&mut self) -> Result<()> {
        let name = self.expect_identifier(None)?;
        self.builder.declare_resource(&name.text).at_line(name.line)?;
        let fields = self.parse_field_block(&name.text, FieldSetKind::Resource)?;
        self.builder.define_resource(fields).at_line(name.line)
    }

    fn parse_data(&mut self) -> Result<()> {
        let name = self.expect_identifier(None)?;
        let fields = self.parse_field_block(&name.text, FieldSetKind::Data)?;
        self.builder.define_data(fields).at_line(name.line)
    }

    fn parse_enum(&mut self) -> Result<()> {
        let name = self.expect_identifier(None)?;
        let open_line = Some(self.expect("{", None)?.line);
        let mut values = Vec::new();

        if self.peek().is_some_and(|t| t.text == "}") {
            self.next();
        } else {
            loop {
                let value = self.expect_identifier(open_line)?;
                values.push(value.text.clone());

                let separator = self.next_or_eof("}", open_line)?;
                match separator.text.as_str() {
                    "}" => break,
                    "," => {
                        // trailing comma
                        if self.peek().is_some_and(|t| t.text == "}") {
                            self.next();
                            break;
                        }
                    }
                    _ => return Err(syntax(separator, ",")),
                }
            }
        }

        self.builder
            .define_enum(&name.text, values)
            .at_line(name.line)
    }

    fn parse_field_block(&mut self, owner: &str, kind: FieldSetKind) -> Result<FieldSet> {
        let open_line = Some(self.expect("{", None)?.line);
        let mut fields = FieldSet::new(owner, kind);

        loop {
            let type_token = self.next_or_eof("}", open_line)?;
            if type_token.text == "}" {
                break;
            }
            if type_token.is_symbol() {
                return Err(syntax(type_token, EXPECT_TYPE));
            }
            let ty = self
                .builder
                .schema()
                .type_info(&type_token.text)
                .at_line(type_token.line)?;

            let name = self.expect_identifier(open_line)?;
            self.expect(";", open_line)?;
            fields.insert(&name.text, ty).at_line(name.line)?;
        }

        Ok(fields)
    }
}

fn syntax(token: &Token, expected: &str) -> SchemaError {
    SchemaError::Syntax {
        line: token.line,
        found: token.text.clone(),
        expected: expected.to_string(),
    }
}
