use super::classfile::ClassParseError;

/// JVM base types, `V` included for method returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    Void,
}

impl BaseType {
    fn from_tag(tag: u8) -> Option<Self> {
        let base = match tag {
            b'B' => Self::Byte,
            b'C' => Self::Char,
            b'D' => Self::Double,
            b'F' => Self::Float,
            b'I' => Self::Int,
            b'J' => Self::Long,
            b'S' => Self::Short,
            b'Z' => Self::Boolean,
            b'V' => Self::Void,
            _ => return None,
        };
        Some(base)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Double => "double",
            Self::Float => "float",
            Self::Int => "int",
            Self::Long => "long",
            Self::Short => "short",
            Self::Boolean => "boolean",
            Self::Void => "void",
        }
    }
}

/// A type from a descriptor or a generic signature.
///
/// Descriptors only ever produce `Base`, `Array` and argument-free `Class`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureType {
    Base(BaseType),
    Array(Box<SignatureType>),
    TypeVariable(String),
    /// `internal_name` joins nested segments with `$`; `type_arguments` belong to
    /// the innermost segment.
    Class {
        internal_name: String,
        type_arguments: Vec<TypeArgument>,
    },
}

impl SignatureType {
    pub fn class(internal_name: impl Into<String>) -> Self {
        SignatureType::Class {
            internal_name: internal_name.into(),
            type_arguments: Vec::new(),
        }
    }

    pub fn internal_name(&self) -> Option<&str> {
        match self {
            SignatureType::Class { internal_name, .. } => Some(internal_name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArgument {
    /// `*`
    Any,
    Extends(SignatureType),
    Super(SignatureType),
    Exact(SignatureType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameterSignature {
    pub name: String,
    pub class_bound: Option<SignatureType>,
    pub interface_bounds: Vec<SignatureType>,
}

impl TypeParameterSignature {
    pub fn bounds(&self) -> impl Iterator<Item = &SignatureType> {
        self.class_bound.iter().chain(self.interface_bounds.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameterSignature>,
    pub superclass: SignatureType,
    pub interfaces: Vec<SignatureType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameterSignature>,
    pub parameters: Vec<SignatureType>,
    pub return_type: SignatureType,
    pub throws: Vec<SignatureType>,
}

pub fn parse_field_descriptor(descriptor: &str) -> Result<SignatureType, ClassParseError> {
    parse_field_signature(descriptor)
}

/// Field signatures are a superset of field descriptors.
pub fn parse_field_signature(signature: &str) -> Result<SignatureType, ClassParseError> {
    let mut parser = SignatureParser::new(signature);
    let ty = parser.parse_type()?;
    parser.finish()?;
    Ok(ty)
}

pub fn parse_method_descriptor(descriptor: &str) -> Result<MethodSignature, ClassParseError> {
    parse_method_signature(descriptor)
}

pub fn parse_method_signature(signature: &str) -> Result<MethodSignature, ClassParseError> {
    let mut parser = SignatureParser::new(signature);
    let type_parameters = parser.parse_type_parameters()?;
    parser.expect(b'(')?;
    let mut parameters = Vec::new();
    while parser.peek()? != b')' {
        parameters.push(parser.parse_type()?);
    }
    parser.expect(b')')?;
    let return_type = parser.parse_type()?;
    let mut throws = Vec::new();
    while parser.remaining() > 0 {
        parser.expect(b'^')?;
        throws.push(parser.parse_type()?);
    }
    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
        throws,
    })
}

pub fn parse_class_signature(signature: &str) -> Result<ClassSignature, ClassParseError> {
    let mut parser = SignatureParser::new(signature);
    let type_parameters = parser.parse_type_parameters()?;
    let superclass = parser.parse_type()?;
    let mut interfaces = Vec::new();
    while parser.remaining() > 0 {
        interfaces.push(parser.parse_type()?);
    }
    Ok(ClassSignature {
        type_parameters,
        superclass,
        interfaces,
    })
}

struct SignatureParser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SignatureParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, reason: &str) -> ClassParseError {
        ClassParseError::InvalidSignature {
            signature: self.source.to_string(),
            reason: format!("{reason} at offset {}", self.pos),
        }
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn peek(&self) -> Result<u8, ClassParseError> {
        self.bytes
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.error("unexpected end"))
    }

    fn bump(&mut self) -> Result<u8, ClassParseError> {
        let byte = self.peek()?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, expected: u8) -> Result<(), ClassParseError> {
        if self.bump()? != expected {
            return Err(self.error(&format!("expected '{}'", expected as char)));
        }
        Ok(())
    }

    fn finish(&self) -> Result<(), ClassParseError> {
        if self.remaining() != 0 {
            return Err(self.error("trailing characters"));
        }
        Ok(())
    }

    fn identifier(&mut self, terminators: &[u8]) -> Result<&'a str, ClassParseError> {
        let start = self.pos;
        while self.pos < self.bytes.len() && !terminators.contains(&self.bytes[self.pos]) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("empty identifier"));
        }
        Ok(&self.source[start..self.pos])
    }

    fn parse_type(&mut self) -> Result<SignatureType, ClassParseError> {
        let tag = self.peek()?;
        if let Some(base) = BaseType::from_tag(tag) {
            self.pos += 1;
            return Ok(SignatureType::Base(base));
        }
        match tag {
            b'[' => {
                self.pos += 1;
                Ok(SignatureType::Array(Box::new(self.parse_type()?)))
            }
            b'T' => {
                self.pos += 1;
                let name = self.identifier(b";")?.to_string();
                self.expect(b';')?;
                Ok(SignatureType::TypeVariable(name))
            }
            b'L' => self.parse_class_type(),
            _ => Err(self.error(&format!("unexpected tag '{}'", tag as char))),
        }
    }

    fn parse_class_type(&mut self) -> Result<SignatureType, ClassParseError> {
        self.expect(b'L')?;
        let mut internal_name = self.identifier(b"<;.")?.to_string();
        let mut type_arguments = self.parse_type_arguments()?;

        while self.peek()? == b'.' {
            self.pos += 1;
            let segment = self.identifier(b"<;.")?;
            internal_name.push('$');
            internal_name.push_str(segment);
            type_arguments = self.parse_type_arguments()?;
        }
        self.expect(b';')?;

        Ok(SignatureType::Class {
            internal_name,
            type_arguments,
        })
    }

    fn parse_type_arguments(&mut self) -> Result<Vec<TypeArgument>, ClassParseError> {
        let mut arguments = Vec::new();
        if self.peek()? != b'<' {
            return Ok(arguments);
        }
        self.pos += 1;
        while self.peek()? != b'>' {
            let argument = match self.peek()? {
                b'*' => {
                    self.pos += 1;
                    TypeArgument::Any
                }
                b'+' => {
                    self.pos += 1;
                    TypeArgument::Extends(self.parse_type()?)
                }
                b'-' => {
                    self.pos += 1;
                    TypeArgument::Super(self.parse_type()?)
                }
                _ => TypeArgument::Exact(self.parse_type()?),
            };
            arguments.push(argument);
        }
        self.pos += 1;
        Ok(arguments)
    }

    fn parse_type_parameters(&mut self) -> Result<Vec<TypeParameterSignature>, ClassParseError> {
        let mut parameters = Vec::new();
        if self.peek()? != b'<' {
            return Ok(parameters);
        }
        self.pos += 1;
        while self.peek()? != b'>' {
            let name = self.identifier(b":")?.to_string();
            self.expect(b':')?;
            // An interface-only bound leaves the class bound empty: `T::Ljava/lang/Runnable;`.
            let class_bound = if matches!(self.peek()?, b'L' | b'T' | b'[') {
                Some(self.parse_type()?)
            } else {
                None
            };
            let mut interface_bounds = Vec::new();
            while self.peek()? == b':' {
                self.pos += 1;
                interface_bounds.push(self.parse_type()?);
            }
            parameters.push(TypeParameterSignature {
                name,
                class_bound,
                interface_bounds,
            });
        }
        self.pos += 1;
        Ok(parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("I", SignatureType::Base(BaseType::Int); "int")]
    #[test_case("[[J", SignatureType::Array(Box::new(SignatureType::Array(Box::new(SignatureType::Base(BaseType::Long))))); "nested array")]
    #[test_case("Ljava/lang/String;", SignatureType::class("java/lang/String"); "class")]
    #[test_case("TE;", SignatureType::TypeVariable("E".into()); "type variable")]
    fn parses_field_signatures(signature: &str, expected: SignatureType) {
        assert_eq!(parse_field_signature(signature).expect("signature"), expected);
    }

    #[test]
    fn parses_wildcards_and_inner_segments() {
        let ty = parse_field_signature("Ljava/util/Map<+Ljava/lang/Number;-TK;>.Entry<*>;")
            .expect("signature");
        assert_eq!(
            ty,
            SignatureType::Class {
                internal_name: "java/util/Map$Entry".into(),
                type_arguments: vec![TypeArgument::Any],
            }
        );
    }

    #[test]
    fn parses_generic_class_signature() {
        let signature = parse_class_signature(
            "<E:Ljava/lang/Object;K::Ljava/lang/Comparable<TK;>;>Ljava/util/AbstractList<TE;>;Ljava/util/List<TE;>;",
        )
        .expect("class signature");

        assert_eq!(signature.type_parameters.len(), 2);
        assert_eq!(signature.type_parameters[1].name, "K");
        assert!(signature.type_parameters[1].class_bound.is_none());
        assert_eq!(signature.type_parameters[1].interface_bounds.len(), 1);
        assert_eq!(
            signature.superclass.internal_name(),
            Some("java/util/AbstractList")
        );
        assert_eq!(signature.interfaces.len(), 1);
    }

    #[test]
    fn parses_method_signature_with_throws() {
        let signature =
            parse_method_signature("<T:Ljava/lang/Object;>([TT;I)TT;^Ljava/io/IOException;")
                .expect("method signature");
        assert_eq!(signature.type_parameters[0].name, "T");
        assert_eq!(signature.parameters.len(), 2);
        assert_eq!(signature.return_type, SignatureType::TypeVariable("T".into()));
        assert_eq!(
            signature.throws,
            vec![SignatureType::class("java/io/IOException")]
        );
    }

    #[test]
    fn method_descriptor_with_void_return() {
        let descriptor = parse_method_descriptor("(Ljava/lang/String;Z)V").expect("descriptor");
        assert_eq!(
            descriptor.parameters,
            vec![
                SignatureType::class("java/lang/String"),
                SignatureType::Base(BaseType::Boolean)
            ]
        );
        assert_eq!(descriptor.return_type, SignatureType::Base(BaseType::Void));
    }

    #[test_case("Ljava/lang/String"; "unterminated")]
    #[test_case("Q"; "unknown tag")]
    #[test_case("II"; "trailing")]
    fn rejects_malformed_signatures(signature: &str) {
        assert!(matches!(
            parse_field_signature(signature),
            Err(ClassParseError::InvalidSignature { .. })
        ));
    }
}
