//! EIP-712 Type Registry
//!
//! Named struct definitions and resolution of references between them.

use super::types::{is_primitive_type, Eip712Error, TypedDataField};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Registry of struct types, keyed by type name.
///
/// Field order is preserved exactly as declared. Once built, the registry is
/// only read by the hashing path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRegistry {
    types: BTreeMap<String, Vec<TypedDataField>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_type(mut self, name: impl Into<String>, fields: Vec<TypedDataField>) -> Self {
        self.insert(name, fields);
        self
    }

    /// Register or replace a type definition
    pub fn insert(&mut self, name: impl Into<String>, fields: Vec<TypedDataField>) {
        self.types.insert(name.into(), fields);
    }

    pub fn get(&self, type_name: &str) -> Option<&[TypedDataField]> {
        self.types.get(type_name).map(Vec::as_slice)
    }

    /// Resolve a type name to its ordered field list
    pub fn resolve(&self, type_name: &str) -> Result<&[TypedDataField], Eip712Error> {
        self.get(type_name)
            .ok_or_else(|| Eip712Error::UnknownType(type_name.to_string()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Whether a field type refers to a registered struct (directly or as array element)
    pub fn is_reference(&self, field_type: &str) -> bool {
        self.contains(base_type(field_type))
    }

    /// All struct types reachable from `type_name`, including itself.
    ///
    /// Each type is visited once, so recursive type graphs terminate.
    pub fn dependencies(&self, type_name: &str) -> Result<BTreeSet<String>, Eip712Error> {
        self.resolve(type_name)?;

        let mut found = BTreeSet::new();
        let mut to_visit = vec![type_name.to_string()];

        while let Some(current) = to_visit.pop() {
            if found.contains(&current) {
                continue;
            }

            let fields = self.resolve(&current)?;
            for field in fields {
                let base = base_type(&field.type_name);
                if self.contains(base) && !found.contains(base) {
                    to_visit.push(base.to_string());
                }
            }
            found.insert(current);
        }

        Ok(found)
    }

    /// Check that every field is named, every type string is well formed and
    /// every base type is a primitive or a registered struct
    pub fn validate(&self) -> Result<(), Eip712Error> {
        for (type_name, fields) in &self.types {
            if type_name.is_empty() || type_name.contains('[') {
                return Err(Eip712Error::InvalidType(type_name.clone()));
            }
            if is_primitive_type(type_name) {
                return Err(Eip712Error::InvalidType(format!(
                    "{} shadows a primitive type",
                    type_name
                )));
            }

            for field in fields {
                if field.name.is_empty() {
                    return Err(Eip712Error::InvalidType(format!(
                        "{} has a field without a name",
                        type_name
                    )));
                }
                self.validate_field_type(&field.type_name)?;
            }
        }

        Ok(())
    }

    fn validate_field_type(&self, type_name: &str) -> Result<(), Eip712Error> {
        let mut current = type_name;
        while let Some((element, _)) = split_array(current)? {
            current = element;
        }

        if current.is_empty() {
            return Err(Eip712Error::InvalidType(type_name.to_string()));
        }
        if is_primitive_type(current) || self.contains(current) {
            return Ok(());
        }

        Err(Eip712Error::UnknownType(current.to_string()))
    }
}

/// Size suffix of an array type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayLength {
    Dynamic,
    Fixed(usize),
}

/// Split the outermost array suffix off a type string.
///
/// `"Person[][2]"` -> `("Person[]", Fixed(2))`; non-array types give `None`.
pub fn split_array(type_name: &str) -> Result<Option<(&str, ArrayLength)>, Eip712Error> {
    if !type_name.ends_with(']') {
        if type_name.contains('[') {
            return Err(Eip712Error::InvalidType(type_name.to_string()));
        }
        return Ok(None);
    }

    let open = type_name
        .rfind('[')
        .ok_or_else(|| Eip712Error::InvalidType(type_name.to_string()))?;
    let element = &type_name[..open];
    let size = &type_name[open + 1..type_name.len() - 1];

    if element.is_empty() {
        return Err(Eip712Error::InvalidType(type_name.to_string()));
    }
    if size.is_empty() {
        return Ok(Some((element, ArrayLength::Dynamic)));
    }
    if !size.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Eip712Error::InvalidType(type_name.to_string()));
    }

    let len = size
        .parse()
        .map_err(|_| Eip712Error::InvalidType(type_name.to_string()))?;
    Ok(Some((element, ArrayLength::Fixed(len))))
}

/// Get the base type from a potentially array type
/// e.g., "Person[]" -> "Person", "uint256[10]" -> "uint256"
pub fn base_type(type_name: &str) -> &str {
    match type_name.find('[') {
        Some(bracket_pos) => &type_name[..bracket_pos],
        None => type_name,
    }
}

#[cfg(test)]
mod registry_tests {
    use super::*;

    fn mail_registry() -> TypeRegistry {
        TypeRegistry::new()
            .with_type(
                "Person",
                vec![
                    TypedDataField::new("name", "string"),
                    TypedDataField::new("wallet", "address"),
                ],
            )
            .with_type(
                "Mail",
                vec![
                    TypedDataField::new("from", "Person"),
                    TypedDataField::new("to", "Person[]"),
                    TypedDataField::new("contents", "string"),
                ],
            )
    }

    #[test]
    fn test_resolve() {
        let registry = mail_registry();
        assert_eq!(registry.resolve("Person").unwrap().len(), 2);
        assert_eq!(
            registry.resolve("Nobody").unwrap_err(),
            Eip712Error::UnknownType("Nobody".to_string())
        );
    }

    #[test]
    fn test_is_reference() {
        let registry = mail_registry();
        assert!(registry.is_reference("Person"));
        assert!(registry.is_reference("Person[]"));
        assert!(registry.is_reference("Person[3]"));
        assert!(!registry.is_reference("address"));
        assert!(!registry.is_reference("uint256[]"));
    }

    #[test]
    fn test_dependencies() {
        let registry = mail_registry();
        let deps = registry.dependencies("Mail").unwrap();
        assert_eq!(deps.into_iter().collect::<Vec<_>>(), vec!["Mail", "Person"]);
    }

    #[test]
    fn test_dependencies_terminate_on_recursion() {
        let registry = TypeRegistry::new().with_type(
            "Node",
            vec![
                TypedDataField::new("value", "uint256"),
                TypedDataField::new("children", "Node[]"),
            ],
        );
        let deps = registry.dependencies("Node").unwrap();
        assert_eq!(deps.len(), 1);
    }

    #[test]
    fn test_split_array() {
        assert_eq!(split_array("uint256").unwrap(), None);
        assert_eq!(
            split_array("Person[]").unwrap(),
            Some(("Person", ArrayLength::Dynamic))
        );
        assert_eq!(
            split_array("uint8[][4]").unwrap(),
            Some(("uint8[]", ArrayLength::Fixed(4)))
        );
        assert!(split_array("Person[").is_err());
        assert!(split_array("Person[x]").is_err());
        assert!(split_array("[]").is_err());
    }

    #[test]
    fn test_base_type() {
        assert_eq!(base_type("Person[]"), "Person");
        assert_eq!(base_type("uint256[10]"), "uint256");
        assert_eq!(base_type("address"), "address");
    }

    #[test]
    fn test_validate() {
        assert!(mail_registry().validate().is_ok());

        let dangling = mail_registry().with_type("Box", vec![TypedDataField::new("item", "Gift")]);
        assert_eq!(
            dangling.validate().unwrap_err(),
            Eip712Error::UnknownType("Gift".to_string())
        );

        let unnamed = TypeRegistry::new().with_type("Empty", vec![TypedDataField::new("", "bool")]);
        assert!(matches!(unnamed.validate(), Err(Eip712Error::InvalidType(_))));
    }
}
