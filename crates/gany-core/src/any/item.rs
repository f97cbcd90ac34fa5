//! Indexing, containers and iteration

use super::{Any, AnyValue};
use crate::caster::Caster;
use crate::error::{GanyError, GanyResult};
use crate::iterator::IteratorItem;
use crate::kind::MetaFunction;

fn index_of(key: &Any) -> Option<usize> {
    let idx = key.to_int64().ok()?;
    usize::try_from(idx).ok()
}

impl Any {
    /// Read `key`
    ///
    /// A string key containing `.` (past the first byte) on a non-Array
    /// walks the path segment by segment, skipping empty segments.
    pub fn get_item(&self, key: impl Into<Any>) -> GanyResult<Any> {
        self.get_item_any(&key.into())
    }

    /// Read `key`, mapping any error to Undefined
    pub fn get(&self, key: impl Into<Any>) -> Any {
        self.get_item(key).unwrap_or_default()
    }

    pub(crate) fn get_item_any(&self, key: &Any) -> GanyResult<Any> {
        if self.is_undefined() {
            return Ok(Any::undefined());
        }

        if let (Some(path), false) = (key.as_str(), self.is_array()) {
            if path.find('.').map_or(false, |i| i > 0) {
                let mut current = self.clone();
                for segment in path.split('.').filter(|s| !s.is_empty()) {
                    current = current.get_item_any(&Any::from(segment))?;
                }
                return Ok(current);
            }
        }

        match self.value() {
            AnyValue::Object(body) => {
                let Some(name) = key.as_str() else {
                    return Ok(Any::undefined());
                };
                let found = body.entries.lock().get(name).cloned();
                match found {
                    Some(v) if !v.is_undefined() => Ok(v),
                    _ => match self.class().get_item(self, key) {
                        Ok(v) => Ok(v),
                        Err(e) if self.is_user_object() => Err(e),
                        Err(_) => Ok(Any::undefined()),
                    },
                }
            }
            AnyValue::Array(items) => {
                if key.is_string() {
                    return Ok(self.class().get_item(self, key).unwrap_or_default());
                }
                let items = items.lock();
                Ok(index_of(key)
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or_default())
            }
            AnyValue::Enum(e) => {
                if !key.is_string() {
                    return Ok(Any::undefined());
                }
                e.object().get_item_any(key)
            }
            AnyValue::Class(class) if key.is_string() => {
                Ok(class.find_member(key.as_str().unwrap_or_default()).unwrap_or_default())
            }
            _ => self.class().get_item(self, key),
        }
    }

    /// Write `key`
    ///
    /// Undefined turns into a new Object first. Writes to an Array index out
    /// of range are ignored. A key naming a property of a dynamic class
    /// instance goes through the property setter.
    pub fn set_item(&mut self, key: impl Into<Any>, value: impl Into<Any>) -> GanyResult<()> {
        if self.is_undefined() {
            *self = Any::object();
        }
        let (key, value) = (key.into(), value.into());
        match self.value() {
            AnyValue::Object(body) => {
                let Some(name) = key.as_str() else {
                    return Ok(());
                };
                if let Some(class) = body.class.get() {
                    if class.find_member(name).map_or(false, |m| m.is_property()) {
                        return class.set_item(self, &key, &value);
                    }
                }
                body.entries.lock().insert(name.to_string(), value);
                Ok(())
            }
            AnyValue::Array(items) => {
                let mut items = items.lock();
                if let Some(slot) = index_of(&key).and_then(|i| items.get_mut(i)) {
                    *slot = value;
                }
                Ok(())
            }
            AnyValue::Enum(e) => e.object().clone().set_item(key, value),
            _ => self.class().set_item(self, &key, &value),
        }
    }

    /// Remove `key`
    pub fn del_item(&self, key: impl Into<Any>) -> GanyResult<()> {
        let key = key.into();
        match self.value() {
            AnyValue::Undefined => Ok(()),
            AnyValue::Object(body) => match key.as_str() {
                Some(name) => {
                    body.entries.lock().remove(name);
                    Ok(())
                }
                None => Err(GanyError::Runtime(
                    "DelItem object expects a string as index.".to_string(),
                )),
            },
            AnyValue::Array(_) => {
                self.erase(key);
                Ok(())
            }
            _ => self
                .class()
                .call(self, MetaFunction::DelItem.name(), &[key])
                .map(|_| ()),
        }
    }

    /// Membership test
    ///
    /// Objects test their keys, Arrays test for an equal element, classes
    /// test their members. Other values use a `contains` method when their
    /// class has one.
    pub fn contains(&self, id: impl Into<Any>) -> bool {
        let id = id.into();
        if id.is_undefined() || id.is_null() {
            return false;
        }
        match self.value() {
            AnyValue::Object(body) => {
                return id
                    .as_str()
                    .map_or(false, |k| body.entries.lock().contains_key(k));
            }
            AnyValue::Array(_) => {
                return self.array_items().iter().any(|v| v.equal_to(&id).unwrap_or(false));
            }
            _ => {}
        }
        if self.class().contains_member("contains") {
            if let Ok(found) = self.call("contains", std::slice::from_ref(&id)) {
                return found.to_bool().unwrap_or(false);
            }
        }
        match (self.as_class(), id.as_str()) {
            (Some(class), Some(name)) => class.contains_member(name),
            _ => false,
        }
    }

    /// Remove a key from an Object or an index from an Array
    pub fn erase(&self, id: impl Into<Any>) {
        let id = id.into();
        match self.value() {
            AnyValue::Object(body) => {
                if let Some(k) = id.as_str() {
                    body.entries.lock().remove(k);
                }
            }
            AnyValue::Array(items) => {
                let mut items = items.lock();
                if let Some(i) = index_of(&id).filter(|i| *i < items.len()) {
                    items.remove(i);
                }
            }
            _ => {}
        }
    }

    /// Append to an Array; ignored for other kinds
    pub fn push_back(&self, value: impl Into<Any>) {
        if let Some(items) = self.array_body() {
            items.lock().push(value.into());
        }
    }

    /// Empty an Array or Object
    pub fn clear(&self) {
        match self.value() {
            AnyValue::Object(body) => body.entries.lock().clear(),
            AnyValue::Array(items) => items.lock().clear(),
            _ => {}
        }
    }

    /// Container size, 0 for non-containers
    pub fn size(&self) -> usize {
        match self.value() {
            AnyValue::Object(body) => body.entries.lock().len(),
            AnyValue::Array(items) => items.lock().len(),
            _ => 0,
        }
    }

    /// Length; non-containers use `__len`
    pub fn length(&self) -> GanyResult<usize> {
        match self.value() {
            AnyValue::Undefined | AnyValue::Null => Ok(0),
            AnyValue::Object(_) | AnyValue::Array(_) => Ok(self.size()),
            _ => {
                let ret = self
                    .class()
                    .call(self, MetaFunction::Length.name(), &[])?;
                Ok(ret.to_int64()?.max(0) as usize)
            }
        }
    }

    /// Iterator over the value, Undefined when its class has none
    pub fn iterator(&self) -> GanyResult<Any> {
        if self.class().contains_member("iterator") {
            return self.call("iterator", &[]);
        }
        Ok(Any::undefined())
    }

    /// Ask an iterator for more items
    pub fn has_next(&self) -> GanyResult<bool> {
        self.call("hasNext", &[])?.to_bool()
    }

    /// Advance an iterator
    pub fn next(&self) -> GanyResult<IteratorItem> {
        self.call("next", &[])?.cast::<IteratorItem>()
    }
}

impl<T: Caster> FromIterator<T> for Any {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Any::array_from(iter.into_iter().map(Caster::into_any).collect())
    }
}
