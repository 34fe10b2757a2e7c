use std::fmt::Display;

#[derive(Debug, PartialEq, Eq)]
pub enum ConstantValue {
    Int(i32),
    Char(char),
}

impl ConstantValue {
    pub fn int(value: i32) -> Self {
        ConstantValue::Int(value)
    }

    pub fn char(value: char) -> Self {
        ConstantValue::Char(value)
    }

    pub fn duplicate(&self) -> Self {
        match self {
            ConstantValue::Int(value) => ConstantValue::Int(*value),
            ConstantValue::Char(value) => ConstantValue::Char(*value),
        }
    }

    /// Unary minus. Only integers fold; `None` for a character.
    pub fn negate(self) -> Option<Self> {
        match self {
            ConstantValue::Int(value) => value.checked_neg().map(ConstantValue::Int),
            ConstantValue::Char(_) => None,
        }
    }
}

impl Display for ConstantValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstantValue::Int(value) => write!(f, "{value}"),
            ConstantValue::Char(value) => write!(f, "'{value}'"),
        }
    }
}
