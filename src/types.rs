//! Type trees for declared entities.
//!
//! Every declaration owns its own tree: an array owns its element type, and
//! resolving a type alias hands out a fresh [`Type::duplicate`] rather than a
//! shared node. Dropping a tree releases elements before the array node.

use std::fmt::Display;

#[derive(Debug)]
pub enum Type {
    Int,
    Char,
    Array { size: i32, element: Box<Type> },
}

impl Type {
    pub fn int() -> Self {
        Type::Int
    }

    pub fn char() -> Self {
        Type::Char
    }

    /// Takes ownership of `element`. The size is not validated.
    pub fn array(size: i32, element: Type) -> Self {
        Type::Array {
            size,
            element: Box::new(element),
        }
    }

    /// Deep copy, independent of `self`.
    pub fn duplicate(&self) -> Self {
        match self {
            Type::Int => Type::Int,
            Type::Char => Type::Char,
            Type::Array { size, element } => Type::array(*size, element.duplicate()),
        }
    }

    /// Structural equality: arrays match when sizes match and elements match.
    pub fn compare(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Int, Type::Int) | (Type::Char, Type::Char) => true,
            (
                Type::Array { size, element },
                Type::Array {
                    size: other_size,
                    element: other_element,
                },
            ) => size == other_size && element.compare(other_element),
            _ => false,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other)
    }
}

impl Eq for Type {}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::Char => write!(f, "Char"),
            Type::Array { size, element } => write!(f, "Arr({size},{element})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> Type {
        Type::array(3, Type::array(4, Type::char()))
    }

    #[test]
    fn duplicate_is_structurally_equal_and_independent() {
        let original = matrix();
        let mut copy = original.duplicate();
        assert!(copy.compare(&original));

        if let Type::Array { element, .. } = &mut copy {
            **element = Type::int();
        }
        assert!(!copy.compare(&original));
        assert_eq!(original.to_string(), "Arr(3,Arr(4,Char))");
    }

    #[test]
    fn compare_distinguishes_kind_size_and_element() {
        assert!(Type::int().compare(&Type::int()));
        assert!(Type::char().compare(&Type::char()));
        assert!(!Type::int().compare(&Type::char()));
        assert!(!Type::array(2, Type::int()).compare(&Type::int()));
        assert!(!Type::array(2, Type::int()).compare(&Type::array(3, Type::int())));
        assert!(!Type::array(2, Type::int()).compare(&Type::array(2, Type::char())));
        assert_eq!(matrix(), matrix());
    }

    #[test]
    fn dropping_an_array_leaves_its_duplicate_intact() {
        let original = matrix();
        let copy = original.duplicate();
        drop(original);
        assert_eq!(copy.to_string(), "Arr(3,Arr(4,Char))");
    }
}
