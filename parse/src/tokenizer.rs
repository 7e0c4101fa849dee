use logos::Logos;

use crate::keywords::Keywords;

#[derive(Logos, Debug, PartialEq, Clone, Copy)]
#[logos(skip r"\s+")]
enum Lexeme {
    /// Identifiers and numbers alike: `x`, `alpha_1`, `3.14`, `2x`.
    #[regex(r"[\p{L}\p{N}][\p{L}\p{N}._]*")]
    Word,

    #[regex(r"%[^\n]*")]
    Comment,

    #[regex(r"[^\s\p{L}\p{N}%]")]
    Symbol,
}

/// Splits one logical line into its lexical parts.
///
/// Words are kept as they are, a lone symbol only if it is a keyword, and a
/// `%` ends the line.
pub fn tokenize<'a>(text: &'a str, keywords: &Keywords) -> Vec<&'a str> {
    let mut lexer = Lexeme::lexer(text);
    let mut tokens = vec![];

    while let Some(lexeme) = lexer.next() {
        match lexeme {
            Ok(Lexeme::Word) => tokens.push(lexer.slice()),
            Ok(Lexeme::Symbol) => {
                let symbol = lexer.slice();
                if symbol.chars().all(|c| keywords.is_keyword(c)) {
                    tokens.push(symbol);
                }
            }
            Ok(Lexeme::Comment) => break,
            Err(()) => {}
        }
    }

    tokens
}
