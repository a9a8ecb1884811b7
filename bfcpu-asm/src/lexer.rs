//! Line-oriented tokenizer for bfCPU source text.
//!
//! Every opcode character becomes one token. Text that is not an opcode is commentary and is
//! kept as a `None` token, so that the listing can reproduce it next to the code.

use crate::isa::Opcode;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// `None` for comment and blank lines, which take no ROM cell.
    pub opcode: Option<Opcode>,
    pub text: String,
}

impl Token {
    fn code(opcode: Opcode, c: char) -> Self {
        Self { opcode: Some(opcode), text: c.to_string() }
    }

    fn comment(text: &str) -> Self {
        Self { opcode: None, text: text.to_string() }
    }
}

pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = vec![];

    for line in source.lines() {
        let line = line.trim_end();
        let mut has_code = false;
        let mut comment = String::new();

        for c in line.chars() {
            match Opcode::from_source_char(c) {
                Some(opcode) => {
                    has_code = true;
                    tokens.push(Token::code(opcode, c));
                }
                None => comment.push(c),
            }
        }

        let comment = comment.trim();
        if !has_code {
            tokens.push(Token::comment(line));
        } else if !comment.is_empty() {
            tokens.push(Token::comment(comment));
        }
    }

    tokens
}
