use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use mongodb::bson::Bson;
use serde::{de::Error, Deserialize, Serialize};
use uuid::Uuid;

pub trait TypedIdMarker {
    fn tag() -> &'static str;

    /// Prefix of identifiers handed out before the first insert.
    fn draft_prefix() -> &'static str;
}

pub struct TypedId<T: TypedIdMarker>(Uuid, PhantomData<T>);

impl<T: TypedIdMarker> TypedId<T> {
    pub fn new() -> TypedId<T> {
        TypedId(Uuid::new_v4(), PhantomData)
    }
}

impl<T: TypedIdMarker> Copy for TypedId<T> {}

impl<T: TypedIdMarker> Clone for TypedId<T> {
    fn clone(&self) -> TypedId<T> {
        *self
    }
}

impl<T: TypedIdMarker> PartialEq for TypedId<T> {
    fn eq(&self, other: &TypedId<T>) -> bool {
        self.0 == other.0
    }
}

impl<T: TypedIdMarker> Eq for TypedId<T> {}

impl<T: TypedIdMarker> Hash for TypedId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T: TypedIdMarker> Display for TypedId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}-{:X}", T::tag(), self.0)
    }
}

impl<T: TypedIdMarker> Debug for TypedId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        Display::fmt(self, f)
    }
}

impl<T: TypedIdMarker> FromStr for TypedId<T> {
    type Err = TypedIdParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let index = s.find('-').ok_or(TypedIdParseError::InvalidFormat)?;
        let (tag, id) = s.split_at(index);

        if tag != T::tag() {
            return Err(TypedIdParseError::InvalidTag);
        }

        let uuid = Uuid::from_str(&id[1..]).map_err(|_| TypedIdParseError::InvalidUuid)?;

        Ok(TypedId(uuid, PhantomData))
    }
}

impl<T: TypedIdMarker> Serialize for TypedId<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de, T: TypedIdMarker> Deserialize<'de> for TypedId<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TypedId::from_str(&s).map_err(|e| D::Error::custom(e))
    }
}

impl<T: TypedIdMarker> From<TypedId<T>> for Bson {
    fn from(id: TypedId<T>) -> Bson {
        id.to_string().into()
    }
}

#[derive(Copy, Clone, Debug)]
pub enum TypedIdParseError {
    InvalidFormat,
    InvalidTag,
    InvalidUuid,
    InvalidDraftPrefix,
}

impl Display for TypedIdParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        Debug::fmt(self, f)
    }
}

/// Identifier of an in-memory record: either assigned by the store or a
/// temporary draft that only lives until the record is first inserted.
pub enum RecordId<T: TypedIdMarker> {
    Draft(String),
    Stored(TypedId<T>),
}

impl<T: TypedIdMarker> RecordId<T> {
    pub fn draft() -> RecordId<T> {
        RecordId::Draft(format!(
            "{}-{}",
            T::draft_prefix(),
            Uuid::new_v4().simple()
        ))
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, RecordId::Draft(_))
    }

    pub fn stored(&self) -> Option<TypedId<T>> {
        match self {
            RecordId::Draft(_) => None,
            RecordId::Stored(id) => Some(*id),
        }
    }
}

impl<T: TypedIdMarker> From<TypedId<T>> for RecordId<T> {
    fn from(id: TypedId<T>) -> RecordId<T> {
        RecordId::Stored(id)
    }
}

impl<T: TypedIdMarker> Clone for RecordId<T> {
    fn clone(&self) -> RecordId<T> {
        match self {
            RecordId::Draft(draft) => RecordId::Draft(draft.clone()),
            RecordId::Stored(id) => RecordId::Stored(*id),
        }
    }
}

impl<T: TypedIdMarker> PartialEq for RecordId<T> {
    fn eq(&self, other: &RecordId<T>) -> bool {
        match (self, other) {
            (RecordId::Draft(a), RecordId::Draft(b)) => a == b,
            (RecordId::Stored(a), RecordId::Stored(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: TypedIdMarker> Eq for RecordId<T> {}

impl<T: TypedIdMarker> Hash for RecordId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            RecordId::Draft(draft) => draft.hash(state),
            RecordId::Stored(id) => id.hash(state),
        }
    }
}

impl<T: TypedIdMarker> Display for RecordId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            RecordId::Draft(draft) => f.write_str(draft),
            RecordId::Stored(id) => Display::fmt(id, f),
        }
    }
}

impl<T: TypedIdMarker> Debug for RecordId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        Display::fmt(self, f)
    }
}

impl<T: TypedIdMarker> FromStr for RecordId<T> {
    type Err = TypedIdParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = TypedId::from_str(s) {
            return Ok(RecordId::Stored(id));
        }

        match s.strip_prefix(T::draft_prefix()) {
            Some(rest) if rest.len() > 1 && rest.starts_with('-') => {
                Ok(RecordId::Draft(s.to_string()))
            }
            _ => Err(TypedIdParseError::InvalidDraftPrefix),
        }
    }
}

impl<T: TypedIdMarker> Serialize for RecordId<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de, T: TypedIdMarker> Deserialize<'de> for RecordId<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordId::from_str(&s).map_err(|e| D::Error::custom(e))
    }
}
