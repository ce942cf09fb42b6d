//! The subject: a state tag plus the attributes that state prescribes.

use super::state::{State, STATE_TAG};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute map of a subject, excluding its state tag.
pub type Fields = serde_json::Map<String, Value>;

/// A lifecycle entity: exactly one state tag and zero or more attributes.
///
/// In its flat record form a subject is a single JSON object whose `state`
/// key holds the tag and whose other keys are the attributes. The attribute
/// map never contains the `state` key itself; every constructor strips it.
///
/// # Example
///
/// ```rust
/// use shapeshift::core::{State, Subject};
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
/// enum UserState { Created, Verified }
///
/// impl State for UserState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Created => "CREATED",
///             Self::Verified => "VERIFIED",
///         }
///     }
/// }
///
/// let user = Subject::new(UserState::Created)
///     .with("email", "me@example.com")
///     .with("verified_at", json!(null));
///
/// assert_eq!(
///     user.to_value().unwrap(),
///     json!({ "state": "CREATED", "email": "me@example.com", "verified_at": null })
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Subject<S: State> {
    state: S,
    #[serde(flatten)]
    fields: Fields,
}

impl<S: State> Subject<S> {
    /// Create a subject in `state` with no attributes.
    pub fn new(state: S) -> Self {
        Self {
            state,
            fields: Fields::new(),
        }
    }

    /// Create a subject from a tag and an attribute map.
    ///
    /// A `state` key inside `fields` is dropped: the tag argument wins.
    pub fn from_parts(state: S, mut fields: Fields) -> Self {
        fields.remove(STATE_TAG);
        Self { state, fields }
    }

    /// Create a subject from a tag and any serializable attribute struct.
    ///
    /// Fails if `attributes` does not serialize to a JSON object.
    pub fn encode<T: Serialize>(state: S, attributes: &T) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(attributes)? {
            Value::Object(fields) => Ok(Self::from_parts(state, fields)),
            other => Err(serde_json::Error::custom(format!(
                "subject attributes must serialize to an object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Parse a subject from its flat record form.
    pub fn from_value(record: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(record)
    }

    /// Render the subject in its flat record form.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Return the subject with `key` set to `value`.
    ///
    /// The reserved `state` key is ignored; change the tag through a
    /// transition instead.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != STATE_TAG {
            self.fields.insert(key, value.into());
        }
        self
    }

    /// The current state tag.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// The attributes, excluding the state tag.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Look up a single attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Decode the attributes into a typed view.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }

    /// Split into tag and attributes.
    pub fn into_parts(self) -> (S, Fields) {
        (self.state, self.fields)
    }
}

/// Human-readable name of a JSON value's kind, used in diagnostics.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    enum DocState {
        Draft,
        Published,
    }

    impl State for DocState {
        fn name(&self) -> &str {
            match self {
                Self::Draft => "DRAFT",
                Self::Published => "PUBLISHED",
            }
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Draft {
        title: String,
        revision: u32,
    }

    #[test]
    fn serializes_flat_with_tag() {
        let doc = Subject::new(DocState::Draft)
            .with("title", "Release notes")
            .with("revision", 3);

        assert_eq!(
            doc.to_value().unwrap(),
            json!({ "state": "DRAFT", "title": "Release notes", "revision": 3 })
        );
    }

    #[test]
    fn parses_flat_record() {
        let doc = Subject::<DocState>::from_value(json!({
            "state": "PUBLISHED",
            "title": "Release notes",
        }))
        .unwrap();

        assert_eq!(doc.state(), &DocState::Published);
        assert_eq!(doc.get("title"), Some(&json!("Release notes")));
        assert!(doc.get("state").is_none());
    }

    #[test]
    fn unknown_tag_fails_to_parse() {
        let result = Subject::<DocState>::from_value(json!({ "state": "ARCHIVED" }));
        assert!(result.is_err());
    }

    #[test]
    fn tag_key_is_never_an_attribute() {
        let mut fields = Fields::new();
        fields.insert("state".to_string(), json!("PUBLISHED"));
        fields.insert("title".to_string(), json!("x"));

        let doc = Subject::from_parts(DocState::Draft, fields).with("state", "PUBLISHED");

        assert_eq!(doc.state(), &DocState::Draft);
        assert_eq!(doc.fields().len(), 1);
    }

    #[test]
    fn encode_and_decode_typed_attributes() {
        let draft = Draft {
            title: "Changelog".to_string(),
            revision: 1,
        };

        let doc = Subject::encode(DocState::Draft, &draft).unwrap();
        assert_eq!(doc.get("revision"), Some(&json!(1)));

        let decoded: Draft = doc.decode().unwrap();
        assert_eq!(decoded, draft);
    }

    #[test]
    fn encode_rejects_non_object_attributes() {
        let result = Subject::encode(DocState::Draft, &vec![1, 2, 3]);
        assert!(result.is_err());
    }
}
