use std::{borrow::Borrow, fmt, hash::Hash, ops::Deref};

#[derive(Debug, Clone)]
pub enum AttrValue {
    Bool(bool),
    OwnedStr(String),
    StaticStr(&'static str),
    Integer(i64),
}

impl AttrValue {
    pub fn to_str(&self) -> Option<&str> {
        match self {
            Self::OwnedStr(s) => Some(s),
            Self::StaticStr(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value; string values holding digits are parsed.
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::OwnedStr(_) | Self::StaticStr(_) => self.to_str()?.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::OwnedStr(_) | Self::StaticStr(_), Self::OwnedStr(_) | Self::StaticStr(_)) => {
                self.to_str() == other.to_str()
            }
            (Self::Integer(lhs), Self::Integer(rhs)) => lhs == rhs,
            (Self::Bool(lhs), Self::Bool(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl Eq for AttrValue {}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::OwnedStr(value)
    }
}

impl From<&'static str> for AttrValue {
    fn from(value: &'static str) -> Self {
        AttrValue::StaticStr(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Integer(value)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Integer(value.into())
    }
}

#[derive(Debug, Clone)]
pub enum Name {
    Static(&'static str),
    Owned(String),
}

impl Hash for Name {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_ref().hash(state)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        match self {
            Self::Owned(s) => s,
            Self::Static(s) => s,
        }
    }
}

impl Deref for Name {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.as_ref() == other.as_ref()
    }
}

impl Eq for Name {}

impl From<&'static str> for Name {
    fn from(value: &'static str) -> Self {
        Name::Static(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::Owned(value)
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        self.as_ref()
    }
}
