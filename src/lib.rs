#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

//! Lazily initialized objects.
//!
//! [`proxy_lazy`] returns a handle that behaves like the object a factory
//! produces, while only running that factory on the first reflective
//! operation. [`lazy_destructure`] extends this to destructuring, and
//! [`recall`] finds the resolver behind a handle without resolving it.
//!
//! The `lzi` binary is a small REPL for poking at handles.

use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline};

pub use config::Config;
pub use destructure::{lazy_destructure, lazy_destructure_with, pair};
pub use env::Env;
pub use lazy::{proxy_lazy, proxy_lazy_with, LazyObject, LazyOptions, Resolver};
pub use object::{Key, Kind, LzErr, LzResult, Obj, Ordinary, PropertyDescriptor, Protocol, Symbol, Value};
pub use read::Form;
pub use registry::{live_handles, recall};

pub struct Runtime {
    repl: Term,
    env: Env,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(Runtime))
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}

pub struct Term {
    prompt: DefaultPrompt,
    reedline: Reedline,
}

impl Runtime {
    pub fn new(repl: Term) -> Self {
        Self {
            repl,
            env: Env::new(),
        }
    }

    /// `None` for a blank line
    pub fn read_from_stdin(&mut self) -> LzResult<Option<Form>> {
        read::read_stdin(&mut self.repl)
    }

    pub fn eval(&self, form: &Form) -> LzResult<Value> {
        self.env.eval(form)
    }
}

impl Term {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let history = FileBackedHistory::with_file(config.history_size, config.history_path.clone())?;
        let highlighter = highlighter::Lisp::new(env::builtin_names());

        Ok(Self {
            prompt: DefaultPrompt {
                left_prompt: DefaultPromptSegment::Basic("lzi".to_owned()),
                right_prompt: DefaultPromptSegment::Empty,
            },

            reedline: Reedline::create()
                .with_history(Box::new(history))
                .with_highlighter(Box::new(highlighter)),
        })
    }
}

pub mod config;
pub mod destructure;
pub mod env;
pub mod eval;
pub mod lazy;
pub mod object;
pub mod print;
pub mod read;
pub mod reflect;
pub mod registry;
mod highlighter;
