use std::fmt::Display;

/// Type descriptors. Equality is structural and exact: there are no
/// implicit conversions between them.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Type {
    Int,
    Float,
    Char,
    Void,
    Array {
        size: usize,
        element: Box<Type>,
    },
    Function {
        returns: Box<Type>,
    },
}

impl Type {
    pub fn array(size: usize, element: Type) -> Self {
        Type::Array { size, element: Box::new(element) }
    }

    pub fn function(returns: Type) -> Self {
        Type::Function { returns: Box::new(returns) }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "INT"),
            Type::Float => write!(f, "FLOAT"),
            Type::Char => write!(f, "CHAR"),
            Type::Void => write!(f, "VOID"),
            Type::Array { size, element } => write!(f, "ARRAY[{}]{}", size, element),
            Type::Function { returns } => write!(f, "FUNC {}", returns),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_types() {
        assert_eq!(Type::array(5, Type::Char).to_string(), "ARRAY[5]CHAR");
        assert_eq!(Type::function(Type::Void).to_string(), "FUNC VOID");
    }

    #[test]
    fn arrays_compare_size_and_element() {
        assert_eq!(Type::array(3, Type::Int), Type::array(3, Type::Int));
        assert_ne!(Type::array(3, Type::Int), Type::array(4, Type::Int));
        assert_ne!(Type::array(3, Type::Int), Type::array(3, Type::Float));
    }
}
