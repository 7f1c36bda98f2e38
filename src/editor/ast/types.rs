//! Type lattice for holes and expressions
//!
//! Every hole carries a [`TypeSet`]; every expression reports a single
//! [`DataType`]. Insertion checks reduce to an [`InsertionType`]:
//! - `Valid` when the hole accepts the value directly
//! - `DraftMode` when a registered [`Conversion`] could make it fit
//! - `Invalid` otherwise

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value type produced by an expression or accepted by a hole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Top of the lattice
    Any,
    /// Produced by calls that return nothing (`print`, `.append`)
    Void,
    Number,
    Boolean,
    String,
    /// Result of `range(...)`
    Iterator,
    AnyList,
    NumberList,
    StringList,
    BooleanList,
}

impl DataType {
    pub fn is_list(self) -> bool {
        matches!(
            self,
            DataType::AnyList | DataType::NumberList | DataType::StringList | DataType::BooleanList
        )
    }

    /// Whether a `for` loop can iterate over values of this type
    pub fn is_iterable(self) -> bool {
        self.is_list() || matches!(self, DataType::String | DataType::Iterator | DataType::Any)
    }

    /// List type holding elements of `element`
    pub fn list_of(element: DataType) -> DataType {
        match element {
            DataType::Number => DataType::NumberList,
            DataType::String => DataType::StringList,
            DataType::Boolean => DataType::BooleanList,
            _ => DataType::AnyList,
        }
    }

    /// Type produced by indexing into or iterating over this type
    pub fn element_type(self) -> DataType {
        match self {
            DataType::NumberList | DataType::Iterator => DataType::Number,
            DataType::StringList | DataType::String => DataType::String,
            DataType::BooleanList => DataType::Boolean,
            _ => DataType::Any,
        }
    }

    /// Whether a slot declared as `self` takes a value of type `value` as is
    pub fn accepts(self, value: DataType) -> bool {
        if value == DataType::Void || self == DataType::Void {
            return false;
        }
        if self == value || self == DataType::Any || value == DataType::Any {
            return true;
        }
        self == DataType::AnyList && value.is_list()
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Any => "Any",
            DataType::Void => "Void",
            DataType::Number => "Number",
            DataType::Boolean => "Boolean",
            DataType::String => "String",
            DataType::Iterator => "Iterator",
            DataType::AnyList => "List",
            DataType::NumberList => "List[Number]",
            DataType::StringList => "List[String]",
            DataType::BooleanList => "List[Boolean]",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, duplicate-free set of types accepted by a hole
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeSet(Vec<DataType>);

impl TypeSet {
    pub fn new(types: impl IntoIterator<Item = DataType>) -> Self {
        let mut unique = Vec::new();
        for t in types {
            if !unique.contains(&t) {
                unique.push(t);
            }
        }
        if unique.is_empty() {
            unique.push(DataType::Any);
        }
        Self(unique)
    }

    pub fn any() -> Self {
        Self(vec![DataType::Any])
    }

    pub fn single(t: DataType) -> Self {
        Self(vec![t])
    }

    pub fn types(&self) -> &[DataType] {
        &self.0
    }

    pub fn contains(&self, t: DataType) -> bool {
        self.0.contains(&t)
    }

    pub fn is_any(&self) -> bool {
        self.0.contains(&DataType::Any)
    }

    /// Whether any member accepts `value` without conversion
    pub fn accepts(&self, value: DataType) -> bool {
        self.0.iter().any(|t| t.accepts(value))
    }
}

impl Default for TypeSet {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|t| t.name()).collect();
        f.write_str(&names.join(" | "))
    }
}

/// Verdict every insertion or deletion check reduces to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsertionType {
    Valid,
    DraftMode,
    Invalid,
}

impl InsertionType {
    pub fn is_allowed(self) -> bool {
        self != InsertionType::Invalid
    }

    /// The stricter of two verdicts
    pub fn and(self, other: InsertionType) -> InsertionType {
        match (self, other) {
            (InsertionType::Invalid, _) | (_, InsertionType::Invalid) => InsertionType::Invalid,
            (InsertionType::DraftMode, _) | (_, InsertionType::DraftMode) => {
                InsertionType::DraftMode
            }
            _ => InsertionType::Valid,
        }
    }
}

/// Implicit conversion registered for draft-mode fixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub from: DataType,
    pub to: DataType,
    /// Builtin function that performs the conversion
    pub function: &'static str,
}

impl Conversion {
    fn applies_to(&self, value: DataType) -> bool {
        self.from == value || (self.from == DataType::AnyList && value.is_list())
    }
}

/// Registry of implicit conversions
#[derive(Debug, Clone)]
pub struct ConversionTable {
    entries: Vec<Conversion>,
}

impl ConversionTable {
    /// The conversions offered by the builtin language surface
    pub fn standard() -> Self {
        Self {
            entries: vec![
                Conversion { from: DataType::Number, to: DataType::String, function: "str" },
                Conversion { from: DataType::Boolean, to: DataType::String, function: "str" },
                Conversion { from: DataType::AnyList, to: DataType::String, function: "str" },
                Conversion { from: DataType::String, to: DataType::Number, function: "int" },
            ],
        }
    }

    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn register(&mut self, conversion: Conversion) {
        if !self.entries.contains(&conversion) {
            self.entries.push(conversion);
        }
    }

    /// Conversions turning `value` into something `accepted` takes
    pub fn find(&self, value: DataType, accepted: &TypeSet) -> Vec<&Conversion> {
        self.entries
            .iter()
            .filter(|c| c.applies_to(value) && accepted.accepts(c.to))
            .collect()
    }
}

impl Default for ConversionTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Check a value of type `returns` against the types a hole accepts
pub fn check_insertion(
    accepted: &TypeSet,
    returns: DataType,
    conversions: &ConversionTable,
) -> InsertionType {
    if accepted.accepts(returns) {
        InsertionType::Valid
    } else if !conversions.find(returns, accepted).is_empty() {
        InsertionType::DraftMode
    } else {
        InsertionType::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_accepts_everything_but_void() {
        assert!(DataType::Any.accepts(DataType::Number));
        assert!(DataType::Any.accepts(DataType::StringList));
        assert!(!DataType::Any.accepts(DataType::Void));
    }

    #[test]
    fn test_any_list_accepts_typed_lists() {
        assert!(DataType::AnyList.accepts(DataType::NumberList));
        assert!(!DataType::NumberList.accepts(DataType::StringList));
        assert!(!DataType::Number.accepts(DataType::AnyList));
    }

    #[test]
    fn test_type_set_deduplicates() {
        let set = TypeSet::new([DataType::Number, DataType::String, DataType::Number]);
        assert_eq!(set.types(), &[DataType::Number, DataType::String]);
        assert_eq!(set.to_string(), "Number | String");
    }

    #[test]
    fn test_check_insertion_verdicts() {
        let table = ConversionTable::standard();
        let strings = TypeSet::single(DataType::String);
        let numbers = TypeSet::single(DataType::Number);

        assert_eq!(check_insertion(&strings, DataType::String, &table), InsertionType::Valid);
        assert_eq!(check_insertion(&strings, DataType::Number, &table), InsertionType::DraftMode);
        assert_eq!(check_insertion(&numbers, DataType::AnyList, &table), InsertionType::Invalid);
        assert_eq!(check_insertion(&numbers, DataType::Boolean, &table), InsertionType::Invalid);
    }

    #[test]
    fn test_list_conversion_matches_typed_lists() {
        let table = ConversionTable::standard();
        let strings = TypeSet::single(DataType::String);
        let found = table.find(DataType::NumberList, &strings);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].function, "str");
    }

    #[test]
    fn test_verdict_and_is_strictest() {
        assert_eq!(InsertionType::Valid.and(InsertionType::DraftMode), InsertionType::DraftMode);
        assert_eq!(InsertionType::DraftMode.and(InsertionType::Invalid), InsertionType::Invalid);
        assert_eq!(InsertionType::Valid.and(InsertionType::Valid), InsertionType::Valid);
    }
}
