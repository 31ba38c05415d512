//! A cheaply-cloned handle to a `ValueStore`, so the same underlying store
//! can be moved into a new `Block` every slot while the owner keeps its own
//! handle to call `finalize`/`can_finalize` directly. `Block<VS>` owns its
//! `VS` outright (see `block.rs`), which in Go is a non-issue because
//! `ValueStore` there is an interface passed around by reference; this
//! wrapper recreates that sharing with a single-threaded `Rc<RefCell<T>>`,
//! matching the `Cache` copy-on-write design in `fbc-ledger`.

use std::cell::RefCell;
use std::rc::Rc;

use fbc_consensus_scp_types::{QuorumSlice, SlotValue};

use crate::value_store::ValueStore;

pub struct SharedValueStore<T>(Rc<RefCell<T>>);

impl<T> SharedValueStore<T> {
    pub fn new(inner: T) -> Self {
        SharedValueStore(Rc::new(RefCell::new(inner)))
    }

    pub fn borrow(&self) -> std::cell::Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, T> {
        self.0.borrow_mut()
    }
}

impl<T> Clone for SharedValueStore<T> {
    fn clone(&self) -> Self {
        SharedValueStore(Rc::clone(&self.0))
    }
}

impl<T: ValueStore> ValueStore for SharedValueStore<T> {
    fn combine(&mut self, values: &[SlotValue]) -> SlotValue {
        self.0.borrow_mut().combine(values)
    }

    fn can_finalize(&self, v: &SlotValue) -> bool {
        self.0.borrow().can_finalize(v)
    }

    fn finalize(&mut self, v: &SlotValue, c: u32, h: u32, quorum_slice: &QuorumSlice) {
        self.0.borrow_mut().finalize(v, c, h, quorum_slice)
    }

    fn last(&self) -> SlotValue {
        self.0.borrow().last()
    }

    fn suggest_value(&mut self) -> Option<SlotValue> {
        self.0.borrow_mut().suggest_value()
    }

    fn validate_value(&self, v: &SlotValue) -> bool {
        self.0.borrow().validate_value(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingStore {
        finalized: Vec<SlotValue>,
    }

    impl ValueStore for CountingStore {
        fn combine(&mut self, values: &[SlotValue]) -> SlotValue {
            values.first().cloned().unwrap_or_else(SlotValue::empty)
        }
        fn can_finalize(&self, _v: &SlotValue) -> bool {
            true
        }
        fn finalize(&mut self, v: &SlotValue, _c: u32, _h: u32, _quorum_slice: &QuorumSlice) {
            self.finalized.push(v.clone());
        }
        fn last(&self) -> SlotValue {
            self.finalized.last().cloned().unwrap_or_else(SlotValue::empty)
        }
        fn suggest_value(&mut self) -> Option<SlotValue> {
            None
        }
        fn validate_value(&self, _v: &SlotValue) -> bool {
            true
        }
    }

    #[test]
    fn clones_share_the_same_underlying_store() {
        let a = SharedValueStore::new(CountingStore::default());
        let mut b = a.clone();
        let qs = QuorumSlice::new(vec!["x".into()], 1);
        b.finalize(&SlotValue::from("v1"), 1, 1, &qs);
        assert_eq!(a.last(), SlotValue::from("v1"));
    }
}
