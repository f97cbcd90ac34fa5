//! JSON reading and writing for [`Any`]

mod parser;
mod stringify;

pub use parser::parse;
pub use stringify::stringify;

use crate::any::Any;
use tracing::warn;

/// Parse `text`, falling back to an empty Object on malformed input
pub fn parse_or_empty(text: &str) -> Any {
    match parse(text) {
        Ok(value) => value,
        Err(e) => {
            warn!("JSON parse failed, using an empty object: {}", e);
            Any::object()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_input_gives_empty_object() {
        let v = parse_or_empty("{\"a\":");
        assert!(v.is_object());
        assert_eq!(v.size(), 0);
    }

    #[test]
    fn test_text_round_trip() {
        let text = r#"{"list":[1,2.5,"three",null,true],"nested":{"k":"v"}}"#;
        assert_eq!(stringify(&parse(text).unwrap(), -1), text);
    }
}
