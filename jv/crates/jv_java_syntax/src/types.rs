use std::fmt;
use std::sync::Arc;

/// Java primitive keywords, `void` included so return types stay uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl PrimitiveKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let kind = match keyword {
            "boolean" => Self::Boolean,
            "byte" => Self::Byte,
            "char" => Self::Char,
            "short" => Self::Short,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "void" => Self::Void,
            _ => return None,
        };
        Some(kind)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Void => "void",
        }
    }
}

/// A type written in a declaration position.
///
/// The set of variants is closed on purpose: every consumer dispatches over it
/// with an exhaustive `match`.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Primitive(PrimitiveKind),
    Array(Arc<TypeExpr>),
    Wildcard(WildcardBound),
    /// `Name` or `Outer.Inner`, without type arguments.
    ClassRef(String),
    /// `Name<Args>`; arguments of enclosing segments are not kept.
    Parameterized {
        name: String,
        arguments: Vec<Arc<TypeExpr>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum WildcardBound {
    Unbounded,
    Extends(Arc<TypeExpr>),
    Super(Arc<TypeExpr>),
}

impl TypeExpr {
    /// The referenced class name as written, for class references only.
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            TypeExpr::ClassRef(name) | TypeExpr::Parameterized { name, .. } => Some(name),
            TypeExpr::Primitive(_) | TypeExpr::Array(_) | TypeExpr::Wildcard(_) => None,
        }
    }

    pub fn type_arguments(&self) -> &[Arc<TypeExpr>] {
        match self {
            TypeExpr::Parameterized { arguments, .. } => arguments,
            _ => &[],
        }
    }

    pub fn is_class_reference(&self) -> bool {
        self.reference_name().is_some()
    }

    pub fn array_of(component: Arc<TypeExpr>, dimensions: usize) -> Arc<TypeExpr> {
        (0..dimensions).fold(component, |ty, _| Arc::new(TypeExpr::Array(ty)))
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Primitive(kind) => f.write_str(kind.keyword()),
            TypeExpr::Array(component) => write!(f, "{component}[]"),
            TypeExpr::Wildcard(WildcardBound::Unbounded) => f.write_str("?"),
            TypeExpr::Wildcard(WildcardBound::Extends(bound)) => write!(f, "? extends {bound}"),
            TypeExpr::Wildcard(WildcardBound::Super(bound)) => write!(f, "? super {bound}"),
            TypeExpr::ClassRef(name) => f.write_str(name),
            TypeExpr::Parameterized { name, arguments } => {
                write!(f, "{name}<")?;
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                f.write_str(">")
            }
        }
    }
}

/// Modifier keywords as a bit set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierFlags(u16);

impl ModifierFlags {
    pub const PUBLIC: Self = Self(1 << 0);
    pub const PROTECTED: Self = Self(1 << 1);
    pub const PRIVATE: Self = Self(1 << 2);
    pub const ABSTRACT: Self = Self(1 << 3);
    pub const STATIC: Self = Self(1 << 4);
    pub const FINAL: Self = Self(1 << 5);
    pub const STRICTFP: Self = Self(1 << 6);
    pub const DEFAULT: Self = Self(1 << 7);
    pub const SYNCHRONIZED: Self = Self(1 << 8);
    pub const NATIVE: Self = Self(1 << 9);
    pub const TRANSIENT: Self = Self(1 << 10);
    pub const VOLATILE: Self = Self(1 << 11);
    pub const SEALED: Self = Self(1 << 12);
    pub const NON_SEALED: Self = Self(1 << 13);

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let flag = match keyword {
            "public" => Self::PUBLIC,
            "protected" => Self::PROTECTED,
            "private" => Self::PRIVATE,
            "abstract" => Self::ABSTRACT,
            "static" => Self::STATIC,
            "final" => Self::FINAL,
            "strictfp" => Self::STRICTFP,
            "default" => Self::DEFAULT,
            "synchronized" => Self::SYNCHRONIZED,
            "native" => Self::NATIVE,
            "transient" => Self::TRANSIENT,
            "volatile" => Self::VOLATILE,
            "sealed" => Self::SEALED,
            "non-sealed" => Self::NON_SEALED,
            _ => return None,
        };
        Some(flag)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for ModifierFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Modifiers {
    pub flags: ModifierFlags,
    pub annotations: Vec<Arc<AnnotationExpr>>,
}

impl Modifiers {
    pub fn has(&self, flag: ModifierFlags) -> bool {
        self.flags.contains(flag)
    }
}

/// `@Name(key = value, ...)`; a single unnamed value is stored under `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationExpr {
    pub name: String,
    pub arguments: Vec<ElementValuePair>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementValuePair {
    pub name: String,
    pub value: ElementValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Literal(Literal),
    /// A simple or dotted name, e.g. an enum constant `Color.RED`.
    Reference(String),
    ClassLiteral(Arc<TypeExpr>),
    Annotation(Arc<AnnotationExpr>),
    Array(Vec<ElementValue>),
    /// Any other constant expression, kept as source text.
    Expression(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Char(char),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Null,
}

impl Literal {
    pub fn negate(self) -> Option<Self> {
        match self {
            Literal::Int(value) => Some(Literal::Int(value.wrapping_neg())),
            Literal::Long(value) => Some(Literal::Long(value.wrapping_neg())),
            Literal::Float(value) => Some(Literal::Float(-value)),
            Literal::Double(value) => Some(Literal::Double(-value)),
            _ => None,
        }
    }
}
