//! Two-token lookahead over the [`Tokenizer`], consumed by the [`Parser`](crate::parser::Parser).

use crate::error::Result;
use crate::token::Token;
use crate::tokenizer::Tokenizer;

pub(crate) struct TokenCursor<'a> {
    tokenizer: Tokenizer<'a>,
    cur: Token,
    peek: Token,
}

impl<'a> TokenCursor<'a> {
    pub(crate) fn new(mut tokenizer: Tokenizer<'a>) -> Result<Self> {
        let cur = tokenizer.next_token()?;
        let peek = tokenizer.next_token()?;
        Ok(TokenCursor { tokenizer, cur, peek })
    }

    pub(crate) fn cur(&self) -> &Token {
        &self.cur
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.peek
    }

    pub(crate) fn advance(&mut self) -> Result<()> {
        std::mem::swap(&mut self.cur, &mut self.peek);
        self.peek = self.tokenizer.next_token()?;
        Ok(())
    }
}
