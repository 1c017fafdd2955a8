use std::rc::Rc;
use std::sync::LazyLock;

use anyhow::{anyhow, Context};
use reedline::Signal;
use regex::Regex;
use tap::Pipe;

use crate::object::{LzErr, LzResult};
use crate::Term;

use self::stream::TokenStream;

pub use form::Form;

mod form;
mod stream;

static RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[\s]*([{}()]|"(?:\\.|[^\\"])*"?|;.*|[^\s{}('"`,;)]*)"#)
        .expect("tokenizer regex is valid")
});

/// Split input into tokens: parens, braces, strings, comments and atoms.
/// Comments and whitespace are dropped.
pub fn tokenize(input: &str) -> TokenStream<'_> {
    RE.find_iter(input)
        .map(|it| it.as_str().trim())
        .filter(|it| !it.is_empty() && !it.starts_with(';'))
        .collect()
}

/// Like `tokenize`, but keeps whitespace and comments, for highlighting
pub fn tokenize_with_whitespace(input: &str) -> TokenStream<'_> {
    RE.find_iter(input)
        .map(|it| it.as_str())
        .filter(|it| !it.is_empty())
        .collect()
}

fn get_inp(ctx: &mut Term) -> LzResult<String> {
    match ctx.reedline.read_line(&ctx.prompt) {
        Ok(Signal::Success(line)) => Ok(line),
        Ok(Signal::CtrlD | Signal::CtrlC) => Err(LzErr::Stop),
        any => Err(anyhow!("REPL Err: {any:?}").into()),
    }
}

/// Read one line from the terminal. Blank lines read as `None`.
pub(crate) fn read_stdin(term: &mut Term) -> LzResult<Option<Form>> {
    let line = get_inp(term)?;

    if tokenize(&line).is_eof() {
        return Ok(None);
    }

    line.parse().map(Some)
}

impl core::str::FromStr for Form {
    type Err = LzErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        tokenize(s).parse()
    }
}

impl TokenStream<'_> {
    fn parse(mut self) -> LzResult<Form> {
        let form = self.parse_form()?;

        if self.is_eof() {
            Ok(form)
        } else {
            Err(anyhow!("Unexpected trailing input: {:?}", self.peek().unwrap_or_default()).into())
        }
    }

    fn parse_form(&mut self) -> LzResult<Form> {
        let raw_token = self.next().context("Didnt expect EOF")?;

        match raw_token {
            "(" => self.parse_seq(")")?.pipe(Rc::<[Form]>::from).pipe(Form::List),
            "{" => {
                let items = self.parse_seq("}")?;

                if items.len() % 2 != 0 {
                    return Err(anyhow!("Object literal must have an even number of elements!").into());
                }

                items
                    .chunks_exact(2)
                    .map(|pair| (pair[0].clone(), pair[1].clone()))
                    .collect::<Vec<_>>()
                    .pipe(Rc::<[(Form, Form)]>::from)
                    .pipe(Form::Map)
            }
            // only valid as the end of a sequence, which `parse_seq` consumes
            ")" | "}" => return Err(anyhow!("Mismatched {raw_token}").into()),

            "nil" => Form::Nil,
            "undefined" => Form::Undefined,
            "true" => Form::Bool(true),
            "false" => Form::Bool(false),

            int if int.parse::<i64>().is_ok() => Form::Int(int.parse().context("integer")?),

            string if string.starts_with('"') => {
                if string.len() == 1 || !string.ends_with('"') {
                    return Err(anyhow!("Missing second string delimiter").into());
                }

                unescaper::unescape(&string[1..string.len() - 1])
                    .map_err(|err| anyhow!("Failed to unescape string: {string:?}, Err: {err}"))?
                    .pipe(|it| Form::Str(it.into()))
            }

            kw if kw.starts_with(':') && kw.len() > 1 => Form::Keyword(kw[1..].into()),
            sym => Form::Sym(sym.into()),
        }
        .pipe(Ok)
    }

    fn parse_seq(&mut self, close: &str) -> LzResult<Vec<Form>> {
        let mut items = Vec::new();

        loop {
            match self.peek() {
                Some(token) if token == close => {
                    self.next();
                    return Ok(items);
                }
                Some(_) => items.push(self.parse_form()?),
                None => return Err(anyhow!("Missing closing {close}").into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(s: &str) -> Form {
        s.parse().unwrap()
    }

    #[test]
    fn test_atoms() {
        assert_eq!(read("42"), Form::Int(42));
        assert_eq!(read("-3"), Form::Int(-3));
        assert_eq!(read("nil"), Form::Nil);
        assert_eq!(read("undefined"), Form::Undefined);
        assert_eq!(read(":x"), Form::Keyword("x".into()));
        assert_eq!(read("lazy"), Form::Sym("lazy".into()));
        assert_eq!(read(r#""a\nb""#), Form::Str("a\nb".into()));
    }

    #[test]
    fn test_nested() {
        let form = read(r#"(def! x (lazy {:a 1 "b" (+ 1 2)})) ; trailing comment"#);
        assert_eq!(form.to_string(), r#"(def! x (lazy {:a 1 "b" (+ 1 2)}))"#);
    }

    #[test]
    fn test_errors() {
        assert!("(get x".parse::<Form>().is_err());
        assert!("{:a}".parse::<Form>().is_err());
        assert!(")".parse::<Form>().is_err());
        assert!("1 2".parse::<Form>().is_err());
        assert!(r#""open"#.parse::<Form>().is_err());
    }
}
