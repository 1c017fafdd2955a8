use std::cell::Cell;
use std::rc::Rc;

use lazy_proxy::{
    lazy_destructure, live_handles, pair, proxy_lazy, proxy_lazy_with, recall, reflect, Key,
    LazyOptions, LzErr, LzResult, Ordinary, Value,
};

fn object(entries: &[(&str, i64)]) -> Value {
    Ordinary::from_entries(entries.iter().map(|&(k, v)| (k, Value::Int(v)))).into_value()
}

fn counting(
    make: impl Fn() -> LzResult<Value> + 'static,
) -> (Rc<Cell<usize>>, impl Fn() -> LzResult<Value> + 'static) {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);

    (calls, move || {
        counter.set(counter.get() + 1);
        make()
    })
}

fn key(s: &str) -> Key {
    Key::from(s)
}

#[test]
fn factory_runs_at_most_once() {
    let (calls, factory) = counting(|| Ok(object(&[("a", 1), ("b", 2)])));
    let handle = proxy_lazy(factory);

    assert_eq!(calls.get(), 0);

    assert_eq!(reflect::get(&handle, &key("a")).unwrap(), Value::Int(1));
    reflect::own_keys(&handle).unwrap();
    reflect::get_own_property(&handle, &key("b")).unwrap();
    reflect::has(&handle, &key("a")).unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn callable_factory_runs_at_most_once() {
    let (calls, factory) =
        counting(|| Ok(Ordinary::native_value("f", 0, |_, _| Ok(Value::Int(3)))));
    let callable = proxy_lazy(factory);

    for _ in 0..2 {
        assert_eq!(
            reflect::call(&callable, &Value::Undefined, &[]).unwrap(),
            Value::Int(3)
        );
    }
    reflect::get(&callable, &key("name")).unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn own_keys_are_a_union_with_unconfigurable_keys() {
    let handle = proxy_lazy(|| Ok(object(&[("a", 1), ("b", 2)])));

    let keys = reflect::own_keys(&handle).unwrap();
    let mut names = keys
        .iter()
        .filter_map(Key::as_str)
        .map(str::to_owned)
        .collect::<Vec<_>>();
    names.sort();

    assert_eq!(names, ["a", "arguments", "b", "caller", "prototype"]);
    assert_eq!(keys.len(), names.len());
}

#[test]
fn unconfigurable_keys_are_answered_without_resolving() {
    let (calls, factory) = counting(|| Ok(object(&[])));
    let handle = proxy_lazy(factory);

    let desc = reflect::get_own_property(&handle, &key("prototype"))
        .unwrap()
        .unwrap();
    assert!(!desc.is_configurable());
    assert_eq!(calls.get(), 0);
}

#[test]
fn nullish_without_fallback_is_unresolved_and_retried() {
    let (calls, factory) = counting(|| Ok(Value::Undefined));
    let handle = proxy_lazy(factory);

    let err = reflect::get(&handle, &key("x")).unwrap_err();
    assert!(matches!(err, LzErr::UnresolvedTarget));

    assert!(reflect::get(&handle, &key("x")).is_err());
    assert_eq!(calls.get(), 2);
}

#[test]
fn nullish_with_fallback_uses_the_fallback() {
    let handle = proxy_lazy_with(
        || Ok(Value::Null),
        LazyOptions::default().fallback(object(&[])),
    );

    assert_eq!(
        reflect::get(&handle, &key("missing")).unwrap(),
        Value::Undefined
    );
}

#[test]
fn falsy_results_are_real_results() {
    let (calls, factory) = counting(|| Ok(Value::Int(0)));
    let handle = proxy_lazy_with(factory, LazyOptions::default().fallback(Value::Int(9)));

    assert_eq!(reflect::force(&handle).unwrap(), Value::Int(0));
    assert_eq!(reflect::force(&handle).unwrap(), Value::Int(0));
    assert_eq!(calls.get(), 1);
}

#[test]
fn descriptor_queries_are_idempotent() {
    let target = Ordinary::new();
    target.insert(
        key("fixed"),
        lazy_proxy::PropertyDescriptor::frozen(Value::Int(4)),
    );
    let target = target.into_value();
    let handle = proxy_lazy(move || Ok(target.clone()));

    let first = reflect::get_own_property(&handle, &key("fixed")).unwrap();
    let second = reflect::get_own_property(&handle, &key("fixed")).unwrap();

    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn factory_errors_propagate_unchanged() {
    let (calls, factory) = counting(|| Err(anyhow::anyhow!("no database").into()));
    let handle = proxy_lazy(factory);

    let err = reflect::get(&handle, &key("x")).unwrap_err();
    assert_eq!(err.to_string(), "no database");

    // not cached, the next access tries again
    assert!(reflect::get(&handle, &key("x")).is_err());
    assert_eq!(calls.get(), 2);
}

#[test]
fn plain_handles_refuse_calls_without_resolving() {
    let (calls, factory) = counting(|| Ok(object(&[])));
    let handle = proxy_lazy_with(factory, LazyOptions::plain());

    assert!(!handle.is_callable());
    let err = reflect::call(&handle, &Value::Undefined, &[]).unwrap_err();
    assert!(matches!(err, LzErr::InvalidOperation(_)));
    assert_eq!(calls.get(), 0);
}

#[test]
fn destructuring_projects_members_lazily() {
    let reads = Rc::new(Cell::new(0));
    let seen = Rc::clone(&reads);
    let destructurer = lazy_destructure(move || {
        seen.set(seen.get() + 1);
        Ok(object(&[("x", 10), ("y", 20)]))
    });

    let (obj, proj) = pair(&destructurer).unwrap();
    assert_eq!(reads.get(), 0);

    let x = reflect::get(&proj, &key("x")).unwrap();
    assert_eq!(reads.get(), 0);
    assert_eq!(reflect::force(&x).unwrap(), Value::Int(10));
    assert_eq!(reads.get(), 1);

    // the projections share the root
    assert_eq!(reflect::get(&obj, &key("y")).unwrap(), Value::Int(20));
    assert_eq!(reads.get(), 1);
}

#[test]
fn third_pull_is_a_misuse() {
    let destructurer = lazy_destructure(|| Ok(object(&[])));
    let mut iter = reflect::iterate(&destructurer).unwrap();

    assert!(iter.next().unwrap().is_ok());
    assert!(iter.next().unwrap().is_ok());
    assert!(matches!(iter.next(), Some(Err(LzErr::Misuse))));
    assert!(iter.next().is_none());
}

#[test]
fn recall_resolves_without_touching_the_handle() {
    let (calls, factory) = counting(|| Ok(object(&[("a", 1)])));
    let handle = proxy_lazy(factory);

    let resolver = recall(&handle).unwrap();
    assert_eq!(calls.get(), 0);
    assert!(!resolver.is_resolved());

    let value = resolver.resolve().unwrap();
    assert_eq!(reflect::get(&value, &key("a")).unwrap(), Value::Int(1));

    // shared cache
    reflect::get(&handle, &key("a")).unwrap();
    assert_eq!(calls.get(), 1);

    assert!(recall(&object(&[])).is_none());
    assert!(recall(&Value::Int(1)).is_none());
}

#[test]
fn registry_does_not_keep_handles_alive() {
    let captured = Rc::new(object(&[("a", 1)]));
    let before = live_handles();

    let handle = {
        let captured = Rc::clone(&captured);
        proxy_lazy(move || Ok((*captured).clone()))
    };
    assert_eq!(Rc::strong_count(&captured), 2);
    assert_eq!(live_handles(), before + 1);

    drop(handle);
    assert_eq!(Rc::strong_count(&captured), 1);
    assert_eq!(live_handles(), before);
}

#[test]
fn handle_cycles_fail_instead_of_hanging() {
    let slot = Rc::new(std::cell::RefCell::new(Value::Undefined));
    let inner = Rc::clone(&slot);
    let handle = proxy_lazy(move || Ok(inner.borrow().clone()));
    *slot.borrow_mut() = handle.clone();

    assert!(matches!(reflect::force(&handle), Err(LzErr::InvalidOperation(_))));
    assert!(matches!(
        reflect::get(&handle, &key("a")),
        Err(LzErr::InvalidOperation(_))
    ));
    assert!(format!("{handle:#}").ends_with("...>>>>"));
}
