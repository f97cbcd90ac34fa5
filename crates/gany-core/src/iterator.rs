//! Cursor iterators over Arrays and Objects
//!
//! Iterators hold a handle to the container, not a borrow, so the container
//! may change between steps. Array cursors are indices clamped to the current
//! length. Object cursors remember the last key handed out and continue with
//! the next larger key.

use crate::any::Any;
use crate::caster::Caster;
use crate::error::GanyResult;
use crate::kind::MetaFunction;
use crate::registry::Registry;
use std::ops::Bound;

/// One step of an iteration: index or key first, value second
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IteratorItem {
    /// Index or key
    pub first: Any,
    /// Value
    pub second: Any,
}

impl Caster for IteratorItem {}

impl IteratorItem {
    /// Pair `first` with `second`
    pub fn new(first: impl Into<Any>, second: impl Into<Any>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    fn exhausted() -> Self {
        Self::new(Any::null(), Any::null())
    }

    /// Alias of `first`
    pub fn key(&self) -> &Any {
        &self.first
    }

    /// Alias of `second`
    pub fn value(&self) -> &Any {
        &self.second
    }

    fn to_array(&self) -> Any {
        Any::array_from(vec![self.first.clone(), self.second.clone()])
    }
}

impl From<(Any, Any)> for IteratorItem {
    fn from((first, second): (Any, Any)) -> Self {
        Self { first, second }
    }
}

/// Bidirectional cursor over an Array
#[derive(Clone)]
pub struct ArrayIterator {
    array: Any,
    cursor: usize,
    op: Option<usize>,
}

impl Caster for ArrayIterator {}

impl ArrayIterator {
    /// Cursor before the first element of `array`
    pub fn new(array: Any) -> Self {
        Self {
            array,
            cursor: 0,
            op: None,
        }
    }

    fn len(&self) -> usize {
        self.array.size()
    }

    /// Returns true while elements remain ahead of the cursor
    pub fn has_next(&self) -> bool {
        self.cursor < self.len()
    }

    /// Advance; yields `(index, value)`, or `(null, null)` at the end
    pub fn next_item(&mut self) -> IteratorItem {
        let Some(items) = self.array.array_body() else {
            return IteratorItem::exhausted();
        };
        let value = items.lock().get(self.cursor).cloned();
        match value {
            Some(v) => {
                let index = self.cursor;
                self.op = Some(index);
                self.cursor += 1;
                IteratorItem::new(index as i32, v)
            }
            None => IteratorItem::exhausted(),
        }
    }

    /// Remove the element last returned by `next` or `previous`
    pub fn remove(&mut self) {
        let Some(op) = self.op.take() else {
            return;
        };
        if let Some(items) = self.array.array_body() {
            let mut items = items.lock();
            if op < items.len() {
                items.remove(op);
            }
        }
        self.cursor = op;
    }

    /// Returns true while elements remain behind the cursor
    pub fn has_previous(&self) -> bool {
        self.cursor.min(self.len()) > 0
    }

    /// Step back; yields `(index, value)`, or `(null, null)` at the front
    pub fn previous(&mut self) -> IteratorItem {
        let Some(items) = self.array.array_body() else {
            return IteratorItem::exhausted();
        };
        let items = items.lock();
        let cursor = self.cursor.min(items.len());
        if cursor == 0 {
            return IteratorItem::exhausted();
        }
        let index = cursor - 1;
        self.cursor = index;
        self.op = Some(index);
        IteratorItem::new(index as i32, items[index].clone())
    }

    /// Move before the first element
    pub fn to_front(&mut self) {
        self.cursor = 0;
        self.op = None;
    }

    /// Move past the last element
    pub fn to_back(&mut self) {
        self.cursor = self.len();
        self.op = None;
    }
}

/// Forward cursor over an Object in key order
#[derive(Clone)]
pub struct ObjectIterator {
    object: Any,
    position: Option<String>,
    op: Option<String>,
    mutable: bool,
}

impl Caster for ObjectIterator {}

impl ObjectIterator {
    /// Cursor before the first key of `object`
    pub fn new(object: Any) -> Self {
        Self {
            object,
            position: None,
            op: None,
            mutable: true,
        }
    }

    /// Cursor whose `remove` does nothing
    pub fn read_only(object: Any) -> Self {
        Self {
            mutable: false,
            ..Self::new(object)
        }
    }

    fn peek(&self) -> Option<(String, Any)> {
        let body = self.object.object_body()?;
        let entries = body.entries.lock();
        let lower = match &self.position {
            Some(key) => Bound::Excluded(key.as_str()),
            None => Bound::Unbounded,
        };
        entries
            .range::<str, _>((lower, Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone()))
    }

    /// Returns true while keys remain ahead of the cursor
    pub fn has_next(&self) -> bool {
        self.peek().is_some()
    }

    /// Advance; yields `(key, value)`, or `(null, null)` at the end
    pub fn next_item(&mut self) -> IteratorItem {
        match self.peek() {
            Some((key, value)) => {
                self.position = Some(key.clone());
                self.op = Some(key.clone());
                IteratorItem::new(key, value)
            }
            None => IteratorItem::exhausted(),
        }
    }

    /// Remove the entry last returned by `next`
    pub fn remove(&mut self) {
        if !self.mutable {
            return;
        }
        if let Some(key) = self.op.take() {
            self.object.erase(key);
        }
    }

    /// Move before the first key
    pub fn to_front(&mut self) {
        self.position = None;
        self.op = None;
    }
}

/// Register the iterator and iterator item classes
pub(crate) fn register(reg: &Registry) -> GanyResult<()> {
    reg.class::<ArrayIterator>("", "ArrayIterator", "Array iterator.")
        .method("hasNext", |it: &ArrayIterator| it.has_next(), "")
        .method("next", |it: &mut ArrayIterator| it.next_item(), "")
        .method("remove", |it: &mut ArrayIterator| it.remove(), "")
        .method("hasPrevious", |it: &ArrayIterator| it.has_previous(), "")
        .method("previous", |it: &mut ArrayIterator| it.previous(), "")
        .method("toFront", |it: &mut ArrayIterator| it.to_front(), "")
        .method("toBack", |it: &mut ArrayIterator| it.to_back(), "")
        .finish()?;

    reg.class::<ObjectIterator>("", "ObjectIterator", "Object iterator.")
        .method("hasNext", |it: &ObjectIterator| it.has_next(), "")
        .method("next", |it: &mut ObjectIterator| it.next_item(), "")
        .method("remove", |it: &mut ObjectIterator| it.remove(), "")
        .method("toFront", |it: &mut ObjectIterator| it.to_front(), "")
        .finish()?;

    reg.class::<IteratorItem>("", "IteratorItem", "Iterator item.")
        .init(|k: Any, v: Any| IteratorItem::new(k, v), "")
        .property("first", |i: &IteratorItem| i.first.clone(), "")
        .property("second", |i: &IteratorItem| i.second.clone(), "")
        .property("key", |i: &IteratorItem| i.first.clone(), "")
        .property("value", |i: &IteratorItem| i.second.clone(), "")
        .method(MetaFunction::ToObject, |i: &IteratorItem| i.to_array(), "")
        .method(
            MetaFunction::ToString,
            |i: &IteratorItem| i.to_array().to_json_string(-1),
            "",
        )
        .build()?;
    Ok(())
}
