//! GraphQL wire types and the small document reader used by the server.
//!
//! The reader understands single-root-field operations, which is all the
//! user schema needs:
//!
//! ```text
//! [query|mutation [Name] [(variable definitions)]] { field[(arg: $var|"lit", ...)] [{ a b c }] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::model::User;

pub const LIST_QUERY: &str = "query { users { id name email } }";

pub const CREATE_MUTATION: &str = "mutation($name:String!,$email:String!){
  createUser(name:$name, email:$email){ id name email }
}";

pub const USERS_FIELD: &str = "users";
pub const CREATE_USER_FIELD: &str = "createUser";

// Error codes carried in `extensions.code`
pub const PARSE_FAILED: &str = "GRAPHQL_PARSE_FAILED";
pub const VALIDATION_FAILED: &str = "GRAPHQL_VALIDATION_FAILED";
pub const BAD_USER_INPUT: &str = "BAD_USER_INPUT";
pub const BAD_REQUEST: &str = "BAD_REQUEST";

/// Body of `POST /graphql`.
///
/// `variables` is always serialized (as `null` when absent) so the wire form
/// is exactly `{ query, variables }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(default)]
    pub variables: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQlError {
    pub fn with_code(message: impl Into<String>, code: &str) -> Self {
        Self {
            message: message.into(),
            extensions: Some(json!({ "code": code })),
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|e| e.get("code"))
            .and_then(Value::as_str)
    }
}

/// Response envelope. `data: None` omits the key, `Some(Value::Null)` sends
/// an explicit `null` the way executors do after a resolver failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphQlError>>,
}

impl GraphQlResponse {
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    pub fn request_error(error: GraphQlError) -> Self {
        Self {
            data: None,
            errors: Some(vec![error]),
        }
    }

    pub fn field_error(error: GraphQlError) -> Self {
        Self {
            data: Some(Value::Null),
            errors: Some(vec![error]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Variable(String),
    Literal(String),
}

/// A parsed single-root-field operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    pub field: String,
    pub arguments: Vec<(String, ArgValue)>,
    pub selection: Vec<String>,
}

impl Operation {
    /// Resolves an argument to a string, reading `$variables` as needed.
    ///
    /// Returns `None` when the argument is absent, the variable is unset, or
    /// the variable is not a string.
    pub fn string_argument(&self, name: &str, variables: Option<&Value>) -> Option<String> {
        let (_, value) = self.arguments.iter().find(|(n, _)| n == name)?;
        match value {
            ArgValue::Literal(s) => Some(s.clone()),
            ArgValue::Variable(var) => variables?
                .get(var)
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Syntax Error: {0}")]
pub struct ParseError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Punct(char),
    Name(String),
    Str(String),
}

fn tokenize(doc: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = doc.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() || c == ',' => {
                chars.next();
            }
            '#' => {
                while let Some(c) = chars.next() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '{' | '}' | '(' | ')' | ':' | '$' | '!' | '[' | ']' | '=' => {
                tokens.push(Token::Punct(c));
                chars.next();
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('n') => s.push('\n'),
                            Some('t') => s.push('\t'),
                            Some(other) => s.push(other),
                            None => return Err(ParseError("Unterminated string.".to_string())),
                        },
                        Some(other) => s.push(other),
                        None => return Err(ParseError("Unterminated string.".to_string())),
                    }
                }
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Name(name));
            }
            other => {
                return Err(ParseError(format!("Unexpected character \"{other}\".")));
            }
        }
    }

    Ok(tokens)
}

struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn is_punct(&self, c: char) -> bool {
        self.peek() == Some(&Token::Punct(c))
    }

    fn expect_punct(&mut self, c: char) -> Result<(), ParseError> {
        match self.next() {
            Some(Token::Punct(p)) if p == c => Ok(()),
            Some(other) => Err(ParseError(format!("Expected \"{c}\", found {}.", describe(&other)))),
            None => Err(ParseError(format!("Expected \"{c}\", found <EOF>."))),
        }
    }

    fn expect_name(&mut self) -> Result<String, ParseError> {
        match self.next() {
            Some(Token::Name(n)) => Ok(n),
            Some(other) => Err(ParseError(format!("Expected Name, found {}.", describe(&other)))),
            None => Err(ParseError("Expected Name, found <EOF>.".to_string())),
        }
    }

    /// Skips a balanced `( ... )` group; the cursor must sit on `(`.
    fn skip_group(&mut self) -> Result<(), ParseError> {
        self.expect_punct('(')?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.next() {
                Some(Token::Punct('(')) => depth += 1,
                Some(Token::Punct(')')) => depth -= 1,
                Some(_) => {}
                None => return Err(ParseError("Expected \")\", found <EOF>.".to_string())),
            }
        }
        Ok(())
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Punct(c) => format!("\"{c}\""),
        Token::Name(n) => format!("Name \"{n}\""),
        Token::Str(s) => format!("String \"{s}\""),
    }
}

/// Reads a document holding one operation with one root field.
pub fn parse_operation(doc: &str) -> Result<Operation, ParseError> {
    let mut cur = Cursor {
        tokens: tokenize(doc)?,
        pos: 0,
    };

    let mut kind = OperationKind::Query;

    match cur.peek() {
        Some(Token::Punct('{')) => {}
        Some(Token::Name(keyword)) => {
            kind = match keyword.as_str() {
                "query" => OperationKind::Query,
                "mutation" => OperationKind::Mutation,
                other => {
                    return Err(ParseError(format!("Unexpected Name \"{other}\".")));
                }
            };
            cur.next();
            // Operation names are accepted and ignored.
            if let Some(Token::Name(_)) = cur.peek() {
                cur.next();
            }
            if cur.is_punct('(') {
                cur.skip_group()?;
            }
        }
        Some(other) => {
            return Err(ParseError(format!("Unexpected {}.", describe(other))));
        }
        None => return Err(ParseError("Unexpected <EOF>.".to_string())),
    }

    cur.expect_punct('{')?;
    let field = cur.expect_name()?;

    let mut arguments = Vec::new();
    if cur.is_punct('(') {
        cur.next();
        while !cur.is_punct(')') {
            let arg = cur.expect_name()?;
            cur.expect_punct(':')?;
            let value = match cur.next() {
                Some(Token::Punct('$')) => ArgValue::Variable(cur.expect_name()?),
                Some(Token::Str(s)) => ArgValue::Literal(s),
                Some(other) => {
                    return Err(ParseError(format!("Unexpected {}.", describe(&other))));
                }
                None => return Err(ParseError("Unexpected <EOF>.".to_string())),
            };
            arguments.push((arg, value));
        }
        cur.expect_punct(')')?;
    }

    let mut selection = Vec::new();
    if cur.is_punct('{') {
        cur.next();
        while !cur.is_punct('}') {
            selection.push(cur.expect_name()?);
            if cur.is_punct('{') || cur.is_punct('(') {
                return Err(ParseError("Nested selections are not supported.".to_string()));
            }
        }
        cur.expect_punct('}')?;
        if selection.is_empty() {
            return Err(ParseError("Expected Name, found \"}\".".to_string()));
        }
    }

    if !cur.is_punct('}') {
        return match cur.peek() {
            Some(Token::Name(_)) => Err(ParseError(
                "Only a single root field is supported.".to_string(),
            )),
            Some(other) => Err(ParseError(format!("Expected \"}}\", found {}.", describe(other)))),
            None => Err(ParseError("Expected \"}\", found <EOF>.".to_string())),
        };
    }
    cur.next();

    if let Some(extra) = cur.peek() {
        return Err(ParseError(format!("Unexpected {}.", describe(extra))));
    }

    Ok(Operation {
        kind,
        field,
        arguments,
        selection,
    })
}

/// Projects a user onto a selection set.
///
/// Errors with a validation message when a selected field does not exist on
/// `User` or when the selection is empty.
pub fn project_user(user: &User, selection: &[String]) -> Result<Value, String> {
    if selection.is_empty() {
        return Err(
            "Field of type \"User\" must have a selection of subfields.".to_string(),
        );
    }
    let mut out = Map::new();
    for field in selection {
        let value = match field.as_str() {
            "id" => Value::String(user.id.clone()),
            "name" => Value::String(user.name.clone()),
            "email" => Value::String(user.email.clone()),
            "__typename" => Value::String("User".to_string()),
            other => {
                return Err(format!("Cannot query field \"{other}\" on type \"User\"."));
            }
        };
        out.insert(field.clone(), value);
    }
    Ok(Value::Object(out))
}
