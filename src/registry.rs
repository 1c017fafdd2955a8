//! Identity registry: from a lazy handle back to what resolves it.
//!
//! One table per thread, never torn down. It only holds `Weak` references,
//! so an entry dies with its handle; dead entries are swept out as the table
//! grows.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use fxhash::FxHashMap;

use crate::lazy::{LazyObject, Resolver};
use crate::object::Value;

/// sweep once the table reaches this size, then double it
const INITIAL_SWEEP_AT: usize = 64;

struct Registry {
    handles: FxHashMap<usize, Weak<LazyObject>>,
    sweep_at: usize,
}

thread_local! {
    static REGISTRY: RefCell<Registry> = RefCell::new(Registry {
        handles: FxHashMap::default(),
        sweep_at: INITIAL_SWEEP_AT,
    });
}

fn addr(handle: &Rc<LazyObject>) -> usize {
    Rc::as_ptr(handle).cast::<()>() as usize
}

pub(crate) fn track(handle: &Rc<LazyObject>) {
    REGISTRY.with_borrow_mut(|reg| {
        if reg.handles.len() >= reg.sweep_at {
            let before = reg.handles.len();
            reg.handles.retain(|_, it| it.strong_count() > 0);
            reg.sweep_at = (reg.handles.len() * 2).max(INITIAL_SWEEP_AT);
            tracing::debug!(
                swept = before - reg.handles.len(),
                live = reg.handles.len(),
                "swept identity registry"
            );
        }

        // a dead handle's address may be reused by this one
        reg.handles.insert(addr(handle), Rc::downgrade(handle));
    });
}

/// The resolver of a lazy handle, or `None` for anything else.
/// Never resolves the handle.
#[must_use]
pub fn recall(value: &Value) -> Option<Resolver> {
    let obj = value.as_object()?;

    REGISTRY
        .with_borrow(|reg| reg.handles.get(&obj.addr())?.upgrade())
        .map(|handle| handle.resolver())
}

/// How many tracked handles are still alive.
#[must_use]
pub fn live_handles() -> usize {
    REGISTRY.with_borrow(|reg| {
        reg.handles
            .values()
            .filter(|it| it.strong_count() > 0)
            .count()
    })
}
