use anyhow::{anyhow, Context};

use crate::destructure::lazy_destructure;
use crate::env::Env;
use crate::lazy::{proxy_lazy, proxy_lazy_with, LazyOptions};
use crate::object::{Key, LzErr, LzResult, Ordinary, Value};
use crate::read::Form;
use crate::reflect;

macro_rules! err {
    (form: $form:literal) => {
        return ControlFlow::Break(Err(LzErr::Any(anyhow!(concat!("Correct Form: ", $form)))))
    };
}

macro_rules! early_ret {
    ($e:expr) => {
        match $e {
            Ok(o) => o,
            Err(e) => return ControlFlow::Break(Err(e)),
        }
    };
}

enum ControlFlow<B, C> {
    Break(B),
    BreakNone,
    Continue(C),
}

struct EvalTco {
    form: Form,
    env: Env,
}

impl Env {
    pub fn eval(&self, form: &Form) -> LzResult<Value> {
        let mut form = form.clone();
        let mut env = self.clone();

        'l: loop {
            let current = form.clone();

            return match &current {
                Form::List(lst) if lst.is_empty() => Ok(Value::Undefined),
                Form::List(lst) => {
                    let Some(ident) = lst[0].as_sym() else {
                        return env.apply(lst);
                    };

                    match env.specials(ident, lst) {
                        ControlFlow::Break(res) => res,
                        ControlFlow::BreakNone => env.apply(lst),
                        ControlFlow::Continue(EvalTco {
                            form: new_form,
                            env: new_env,
                        }) => {
                            form = new_form;
                            env = new_env;
                            continue 'l;
                        }
                    }
                }

                _ => env.replace_eval(&current),
            };
        }
    }

    fn specials(&self, ident: &str, lst: &[Form]) -> ControlFlow<LzResult<Value>, EvalTco> {
        match (ident, &lst[1..]) {
            ("def!", [Form::Sym(ident), form]) => {
                let value = early_ret!(self.eval(form));
                self.set(ident, value.clone());
                ControlFlow::Break(Ok(value))
            }
            ("def!", _) => err!(form: "(def! <sym> <form>)"),

            ("do", [start @ .., end]) => {
                for form in start {
                    early_ret!(self.eval(form));
                }

                ControlFlow::Continue(EvalTco {
                    form: end.clone(),
                    env: self.clone(),
                })
            }
            ("do", _) => err!(form: "(do <form>+)"),

            ("let*", [Form::List(bindings), body]) if bindings.len() % 2 == 0 => {
                let env = Self::with_outer(self.clone());

                for pair in bindings.chunks_exact(2) {
                    let [Form::Sym(ident), form] = pair else {
                        err!(form: "(let* (<sym> <form>)* <form>)")
                    };
                    // later bindings see the earlier ones
                    let value = early_ret!(env.eval(form));
                    env.set(ident, value);
                }

                ControlFlow::Continue(EvalTco {
                    form: body.clone(),
                    env,
                })
            }
            ("let*", _) => err!(form: "(let* (<sym> <form>)* <form>)"),

            ("if", [cond, then, rest @ ..]) if rest.len() <= 1 => {
                let cond = early_ret!(self.eval(cond));
                let branch = if cond.truthy() {
                    then.clone()
                } else {
                    rest.first().cloned().unwrap_or(Form::Undefined)
                };

                ControlFlow::Continue(EvalTco {
                    form: branch,
                    env: self.clone(),
                })
            }
            ("if", _) => err!(form: "(if <cond> <then> ?<else>)"),

            ("lazy", [form]) => ControlFlow::Break(Ok(proxy_lazy(self.factory(form)))),
            ("lazy", _) => err!(form: "(lazy <form>)"),

            ("lazy-obj", [form]) => ControlFlow::Break(Ok(proxy_lazy_with(
                self.factory(form),
                LazyOptions::plain(),
            ))),
            ("lazy-obj", _) => err!(form: "(lazy-obj <form>)"),

            ("lazy-or", [fallback, form]) => {
                // the fallback is an ordinary value, evaluated right away
                let fallback = early_ret!(self.eval(fallback));
                ControlFlow::Break(Ok(proxy_lazy_with(
                    self.factory(form),
                    LazyOptions::default().fallback(fallback),
                )))
            }
            ("lazy-or", _) => err!(form: "(lazy-or <fallback> <form>)"),

            ("destructure", [form]) => ControlFlow::Break(Ok(lazy_destructure(self.factory(form)))),
            ("destructure", _) => err!(form: "(destructure <form>)"),

            ("bind!", [Form::List(names), form]) => {
                let Some(names) = names.iter().map(Form::as_sym).collect::<Option<Vec<_>>>() else {
                    err!(form: "(bind! (<sym>*) <form>)")
                };
                ControlFlow::Break(self.bind(&names, form))
            }
            ("bind!", _) => err!(form: "(bind! (<sym>*) <form>)"),

            _ => ControlFlow::BreakNone,
        }
    }

    /// A factory that evaluates `form` here, each time it is invoked
    fn factory(&self, form: &Form) -> impl Fn() -> LzResult<Value> + 'static {
        let env = self.clone();
        let form = form.clone();

        move || {
            tracing::info!(%form, "lazy factory invoked");
            env.eval(&form)
        }
    }

    /// Bind `names` to successive values of the iteration protocol of `form`.
    /// Only as many values are pulled as there are names.
    fn bind(&self, names: &[&str], form: &Form) -> LzResult<Value> {
        let iterable = self.eval(form)?;
        let mut values = reflect::iterate(&iterable)?;

        for name in names {
            let value = values
                .next()
                .with_context(|| format!("bind!: nothing left to bind to {name}"))??;
            self.set(name, value);
        }

        Ok(Value::Undefined)
    }

    fn apply(&self, lst: &[Form]) -> LzResult<Value> {
        let [head, args @ ..] = lst else {
            return Ok(Value::Undefined);
        };

        let func = self.eval(head)?;
        let args = args
            .iter()
            .map(|it| self.eval(it))
            .collect::<LzResult<Vec<_>>>()?;

        reflect::call(&func, &Value::Undefined, &args)
    }

    // replaces symbols with their values
    // builds object literals
    fn replace_eval(&self, form: &Form) -> LzResult<Value> {
        Ok(match form {
            Form::Undefined => Value::Undefined,
            Form::Nil => Value::Null,
            Form::Bool(b) => Value::Bool(*b),
            Form::Int(int) => Value::Int(*int),
            Form::Str(s) | Form::Keyword(s) => Value::Str(s.clone()),
            Form::Sym(sym) => self
                .get(sym)
                .with_context(|| format!("Unbound identifier [ {sym} ]"))?,
            Form::Map(entries) => {
                let entries = entries
                    .iter()
                    .map(|(k, v)| Ok((Key::try_from(&self.eval(k)?)?, self.eval(v)?)))
                    .collect::<LzResult<Vec<_>>>()?;

                Ordinary::from_entries(entries).into_value()
            }
            Form::List(_) => self.eval(form)?,
        })
    }
}
