/// Tokens of one input line, with a cursor.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct TokenStream<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> TokenStream<'a> {
    pub fn next(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.pos).copied()?;
        self.pos += 1;
        Some(token)
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    /// the token before the one last returned by `next`
    pub fn prev(&self) -> Option<&'a str> {
        self.pos
            .checked_sub(2)
            .and_then(|it| self.tokens.get(it))
            .copied()
    }
}

impl<'a> FromIterator<&'a str> for TokenStream<'a> {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
            pos: 0,
        }
    }
}
