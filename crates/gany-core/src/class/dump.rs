//! Reflection records

use super::{ClassDescriptor, EnumDescriptor, Property};
use crate::any::Any;
use crate::error::GanyResult;

fn sort_case_insensitive(entries: &mut [(String, Any)]) {
    entries.sort_by_key(|(name, _)| name.to_lowercase());
}

impl ClassDescriptor {
    /// Reflection record
    ///
    /// `class`, `nameSpace`, `doc` and `parents` always; `methods`,
    /// `properties` and `enums` when the class has members, each sorted by
    /// name ignoring case.
    pub fn dump(&self) -> GanyResult<Any> {
        let mut out = Any::object();
        out.set_item("class", self.name())?;
        out.set_item("nameSpace", self.namespace())?;
        out.set_item("doc", self.doc())?;

        let parents = Any::array();
        for p in self.parents() {
            parents.push_back(p.class().name());
        }
        out.set_item("parents", parents)?;

        let attributes = self.attributes();
        if attributes.is_empty() {
            return Ok(out);
        }

        let (mut functions, mut properties, mut enums) = (Vec::new(), Vec::new(), Vec::new());
        for (name, attr) in attributes {
            if attr.is_function() {
                functions.push((name, attr));
            } else if attr.is_property() {
                properties.push((name, attr));
            } else if attr.is_enum() {
                enums.push((name, attr));
            }
        }
        sort_case_insensitive(&mut functions);
        sort_case_insensitive(&mut properties);
        sort_case_insensitive(&mut enums);

        let methods = Any::array();
        for (_, f) in &functions {
            if let Some(f) = f.as_function() {
                methods.push_back(f.dump()?);
            }
        }
        out.set_item("methods", methods)?;

        let props = Any::array();
        for (_, p) in &properties {
            if let Some(p) = p.as_property() {
                props.push_back(p.dump()?);
            }
        }
        out.set_item("properties", props)?;

        let enum_list = Any::array();
        for (_, e) in &enums {
            if let Some(e) = e.as_enum() {
                enum_list.push_back(e.dump()?);
            }
        }
        out.set_item("enums", enum_list)?;

        Ok(out)
    }
}

impl Property {
    /// Reflection record: `name`, `doc`, `type`, `getter`, `setter`
    ///
    /// `type` is the getter's return class, else the setter's value class.
    pub fn dump(&self) -> GanyResult<Any> {
        let mut out = Any::object();
        out.set_item("name", self.name.as_str())?;
        out.set_item("doc", self.doc.as_str())?;

        let from_getter = self
            .getter
            .as_function()
            .and_then(|f| f.overloads().first().cloned())
            .filter(|o| !o.is_variadic())
            .and_then(|o| o.return_class().map(|c| c.name()));
        let from_setter = || {
            self.setter
                .as_function()
                .and_then(|f| f.overloads().first().cloned())
                .filter(|o| !o.is_variadic())
                .and_then(|o| o.params().get(1).map(|c| c.name()))
        };
        if let Some(ty) = from_getter.or_else(from_setter) {
            out.set_item("type", ty)?;
        }

        out.set_item("getter", self.getter.is_function())?;
        out.set_item("setter", self.setter.is_function())?;
        Ok(out)
    }
}

impl EnumDescriptor {
    /// Reflection record: `name`, `doc`, `enum`
    ///
    /// `enum` lists `{key, value}` sorted by value; constants that are not
    /// integers sort last and carry no `value`.
    pub fn dump(&self) -> GanyResult<Any> {
        let mut out = Any::object();
        out.set_item("name", self.name.as_str())?;
        out.set_item("doc", self.doc.as_str())?;

        let mut values: Vec<(String, Option<i32>)> = self
            .object
            .object_entries()
            .into_iter()
            .map(|(k, v)| (k, v.cast::<i32>().ok()))
            .collect();
        values.sort_by_key(|(_, v)| v.unwrap_or(i32::MAX));

        let items = Any::array();
        for (key, value) in values {
            let mut item = Any::object();
            item.set_item("key", key)?;
            if let Some(v) = value {
                item.set_item("value", v)?;
            }
            items.push_back(item);
        }
        out.set_item("enum", items)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::any::Any;
    use crate::class::ClassDescriptor;

    #[test]
    fn test_class_dump_sections() {
        let class = ClassDescriptor::dynamic("geo", "Shape", "a shape");
        class
            .register_function("zeta", &Any::function(|| 1), "", false)
            .unwrap();
        class
            .register_function("Alpha", &Any::function(|| 2), "", false)
            .unwrap();
        class
            .register_property("area", Any::function(|this: Any| this.size() as i32), Any::undefined(), "")
            .unwrap();
        class
            .def_enum("Kind", &Any::object_from([("B", Any::from(2)), ("A", Any::from(1))]), "")
            .unwrap();

        let dump = class.dump().unwrap();
        assert_eq!(dump.get("class").try_to_string().unwrap(), "Shape");
        assert_eq!(dump.get("nameSpace").try_to_string().unwrap(), "geo");
        let methods = dump.get("methods");
        assert_eq!(methods.size(), 2);
        assert_eq!(methods.get(0).get("name").try_to_string().unwrap(), "Shape.Alpha");

        let prop = dump.get("properties").get(0);
        assert_eq!(prop.get("type").try_to_string().unwrap(), "int32");
        assert!(prop.get("getter").to_bool().unwrap());
        assert!(!prop.get("setter").to_bool().unwrap());

        let values = dump.get("enums").get(0).get("enum");
        assert_eq!(values.get(0).get("key").try_to_string().unwrap(), "A");
        assert_eq!(values.get(1).get("value").to_int32().unwrap(), 2);
    }

    #[test]
    fn test_empty_class_dump() {
        let dump = ClassDescriptor::dynamic("", "Empty", "").dump().unwrap();
        assert!(dump.get("parents").is_array());
        assert!(!dump.contains("methods"));
    }
}
