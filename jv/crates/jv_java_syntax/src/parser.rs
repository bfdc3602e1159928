use crate::decl::{
    ClassDecl, ClassKind, CompilationUnit, FieldDecl, ImportDecl, Member, MethodDecl,
    ParameterDecl, TypeParameterDecl,
};
use crate::types::{
    AnnotationExpr, ElementValue, ElementValuePair, Literal, ModifierFlags, Modifiers,
    PrimitiveKind, TypeExpr, WildcardBound,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use tree_sitter::{Node, Parser};

#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error("failed to load the Java grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parser produced no tree for {}", .path.display())]
    NoTree { path: PathBuf },
}

/// Declaration-level Java parser.
///
/// Method bodies and initializer expressions are not lowered; only literal
/// field initializers survive as constants.
pub struct JavaParser {
    parser: Parser,
}

impl JavaParser {
    pub fn new() -> Result<Self, SyntaxError> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_java::LANGUAGE.into())?;
        Ok(Self { parser })
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<CompilationUnit, SyntaxError> {
        let source = fs::read_to_string(path).map_err(|source| SyntaxError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_source(path, &source)
    }

    pub fn parse_source(
        &mut self,
        path: impl Into<PathBuf>,
        source: &str,
    ) -> Result<CompilationUnit, SyntaxError> {
        let path = path.into();
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| SyntaxError::NoTree { path: path.clone() })?;
        let root = tree.root_node();

        let lowering = Lowering {
            source: source.as_bytes(),
        };
        let mut unit = lowering.program(root, path);

        if root.has_error() {
            unit.syntax_errors = count_errors(root);
            warn!(
                path = %unit.path.display(),
                errors = unit.syntax_errors,
                "Java source contains syntax errors"
            );
        }
        debug!(
            path = %unit.path.display(),
            package = unit.package_name(),
            types = unit.types.len(),
            "parsed Java compilation unit"
        );
        Ok(unit)
    }
}

fn count_errors(node: Node<'_>) -> usize {
    if node.is_error() || node.is_missing() {
        return 1;
    }
    if !node.has_error() {
        return 0;
    }
    let mut cursor = node.walk();
    node.children(&mut cursor).map(count_errors).sum()
}

fn is_type_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "annotation_type_declaration"
            | "record_declaration"
    )
}

struct Lowering<'a> {
    source: &'a [u8],
}

impl<'a> Lowering<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn compact(&self, node: Node<'_>) -> String {
        self.text(node)
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .collect()
    }

    fn program(&self, root: Node<'_>, path: PathBuf) -> CompilationUnit {
        let mut package = None;
        let mut imports = Vec::new();
        let mut types = Vec::new();

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_declaration" => package = self.package_name(child),
                "import_declaration" => imports.extend(self.import(child)),
                kind if is_type_declaration(kind) => types.extend(self.class(child)),
                _ => {}
            }
        }

        CompilationUnit {
            path,
            package,
            imports,
            types,
            syntax_errors: 0,
        }
    }

    fn package_name(&self, node: Node<'_>) -> Option<String> {
        let mut cursor = node.walk();
        let name = node
            .named_children(&mut cursor)
            .find(|child| matches!(child.kind(), "identifier" | "scoped_identifier"))
            .map(|child| self.compact(child));
        name
    }

    fn import(&self, node: Node<'_>) -> Option<ImportDecl> {
        let mut is_static = false;
        let mut is_wildcard = false;
        let mut path = None;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "static" => is_static = true,
                "asterisk" => is_wildcard = true,
                "identifier" | "scoped_identifier" => path = Some(self.compact(child)),
                _ => {}
            }
        }

        path.map(|path| ImportDecl {
            path,
            is_static,
            is_wildcard,
        })
    }

    fn class(&self, node: Node<'_>) -> Option<Arc<ClassDecl>> {
        let kind = match node.kind() {
            "class_declaration" => ClassKind::Class,
            "interface_declaration" => ClassKind::Interface,
            "enum_declaration" => ClassKind::Enum,
            "annotation_type_declaration" => ClassKind::Annotation,
            "record_declaration" => ClassKind::Record,
            _ => return None,
        };
        let name = self.text(node.child_by_field_name("name")?).to_string();
        let modifiers = self.modifiers_of(node);
        let type_parameters = node
            .child_by_field_name("type_parameters")
            .map(|list| self.type_parameters(list))
            .unwrap_or_default();

        let superclass = node
            .child_by_field_name("superclass")
            .and_then(|clause| self.first_type(clause));

        let mut interfaces = Vec::new();
        if let Some(clause) = node.child_by_field_name("interfaces") {
            interfaces.extend(self.type_list_of(clause));
        }
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "extends_interfaces" {
                interfaces.extend(self.type_list_of(child));
            }
        }

        let components = if kind == ClassKind::Record {
            node.child_by_field_name("parameters")
                .map(|list| self.formal_parameters(list))
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        let mut members = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            self.body(body, &name, &components, &mut members);
        }
        if kind == ClassKind::Record {
            complete_record(&name, &modifiers, &components, &mut members);
        }

        Some(Arc::new(ClassDecl {
            name,
            kind,
            modifiers,
            type_parameters,
            superclass,
            interfaces,
            members,
        }))
    }

    fn body(
        &self,
        body: Node<'_>,
        owner: &str,
        components: &[Arc<ParameterDecl>],
        members: &mut Vec<Member>,
    ) {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            match child.kind() {
                "field_declaration" | "constant_declaration" => self.fields(child, members),
                "method_declaration" | "annotation_type_element_declaration" => {
                    members.extend(self.method(child).map(Member::Method))
                }
                "constructor_declaration" => {
                    members.extend(self.constructor(child).map(Member::Method))
                }
                "compact_constructor_declaration" => {
                    members.extend(
                        self.compact_constructor(child, components)
                            .map(Member::Method),
                    )
                }
                "enum_constant" => members.extend(self.enum_constant(child, owner).map(Member::Field)),
                "enum_body_declarations" => self.body(child, owner, components, members),
                "static_initializer" => members.push(Member::Initializer { is_static: true }),
                "block" => members.push(Member::Initializer { is_static: false }),
                kind if is_type_declaration(kind) => members.extend(self.class(child).map(Member::Class)),
                _ => {}
            }
        }
    }

    fn fields(&self, node: Node<'_>, members: &mut Vec<Member>) {
        let Some(ty) = node
            .child_by_field_name("type")
            .and_then(|ty| self.type_expr(ty))
        else {
            return;
        };
        let modifiers = self.modifiers_of(node);

        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };
            let dimensions = declarator
                .child_by_field_name("dimensions")
                .map(|dims| self.dimension_count(dims))
                .unwrap_or(0);
            let constant = declarator
                .child_by_field_name("value")
                .and_then(|value| match self.element_value(value) {
                    Some(ElementValue::Literal(literal)) => Some(literal),
                    _ => None,
                });

            members.push(Member::Field(Arc::new(FieldDecl {
                name: self.text(name).to_string(),
                modifiers: modifiers.clone(),
                ty: TypeExpr::array_of(ty.clone(), dimensions),
                is_enum_constant: false,
                constant,
            })));
        }
    }

    fn enum_constant(&self, node: Node<'_>, owner: &str) -> Option<Arc<FieldDecl>> {
        let name = self.text(node.child_by_field_name("name")?).to_string();
        Some(Arc::new(FieldDecl {
            name,
            modifiers: self.modifiers_of(node),
            ty: Arc::new(TypeExpr::ClassRef(owner.to_string())),
            is_enum_constant: true,
            constant: None,
        }))
    }

    fn method(&self, node: Node<'_>) -> Option<Arc<MethodDecl>> {
        let name = self.text(node.child_by_field_name("name")?).to_string();
        let return_type = self.type_expr(node.child_by_field_name("type")?)?;
        let dimensions = node
            .child_by_field_name("dimensions")
            .map(|dims| self.dimension_count(dims))
            .unwrap_or(0);

        Some(Arc::new(MethodDecl {
            name,
            is_constructor: false,
            modifiers: self.modifiers_of(node),
            type_parameters: node
                .child_by_field_name("type_parameters")
                .map(|list| self.type_parameters(list))
                .unwrap_or_default(),
            return_type: Some(TypeExpr::array_of(return_type, dimensions)),
            parameters: node
                .child_by_field_name("parameters")
                .map(|list| self.formal_parameters(list))
                .unwrap_or_default(),
            has_body: node.child_by_field_name("body").is_some(),
            default_value: node
                .child_by_field_name("value")
                .and_then(|value| self.element_value(value)),
        }))
    }

    fn constructor(&self, node: Node<'_>) -> Option<Arc<MethodDecl>> {
        let name = self.text(node.child_by_field_name("name")?).to_string();
        Some(Arc::new(MethodDecl {
            name,
            is_constructor: true,
            modifiers: self.modifiers_of(node),
            type_parameters: node
                .child_by_field_name("type_parameters")
                .map(|list| self.type_parameters(list))
                .unwrap_or_default(),
            return_type: None,
            parameters: node
                .child_by_field_name("parameters")
                .map(|list| self.formal_parameters(list))
                .unwrap_or_default(),
            has_body: true,
            default_value: None,
        }))
    }

    fn compact_constructor(
        &self,
        node: Node<'_>,
        components: &[Arc<ParameterDecl>],
    ) -> Option<Arc<MethodDecl>> {
        let name = self.text(node.child_by_field_name("name")?).to_string();
        Some(Arc::new(MethodDecl {
            name,
            is_constructor: true,
            modifiers: self.modifiers_of(node),
            type_parameters: Vec::new(),
            return_type: None,
            parameters: components.to_vec(),
            has_body: true,
            default_value: None,
        }))
    }

    fn formal_parameters(&self, node: Node<'_>) -> Vec<Arc<ParameterDecl>> {
        let mut parameters = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "formal_parameter" => {
                    let (Some(ty), Some(name)) = (
                        child
                            .child_by_field_name("type")
                            .and_then(|ty| self.type_expr(ty)),
                        child.child_by_field_name("name"),
                    ) else {
                        continue;
                    };
                    let dimensions = child
                        .child_by_field_name("dimensions")
                        .map(|dims| self.dimension_count(dims))
                        .unwrap_or(0);
                    parameters.push(Arc::new(ParameterDecl {
                        name: self.text(name).to_string(),
                        modifiers: self.modifiers_of(child),
                        ty: TypeExpr::array_of(ty, dimensions),
                        is_varargs: false,
                    }));
                }
                "spread_parameter" => {
                    let mut element = None;
                    let mut name = None;
                    let mut inner = child.walk();
                    for part in child.named_children(&mut inner) {
                        match part.kind() {
                            "variable_declarator" => {
                                name = part
                                    .child_by_field_name("name")
                                    .map(|name| self.text(name).to_string());
                            }
                            "modifiers" => {}
                            _ if element.is_none() => element = self.type_expr(part),
                            _ => {}
                        }
                    }
                    if let (Some(element), Some(name)) = (element, name) {
                        parameters.push(Arc::new(ParameterDecl {
                            name,
                            modifiers: self.modifiers_of(child),
                            ty: Arc::new(TypeExpr::Array(element)),
                            is_varargs: true,
                        }));
                    }
                }
                _ => {}
            }
        }
        parameters
    }

    fn modifiers_of(&self, node: Node<'_>) -> Modifiers {
        let mut cursor = node.walk();
        let modifiers = node
            .named_children(&mut cursor)
            .find(|child| child.kind() == "modifiers")
            .map(|list| self.modifiers(list))
            .unwrap_or_default();
        modifiers
    }

    fn modifiers(&self, node: Node<'_>) -> Modifiers {
        let mut modifiers = Modifiers::default();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "annotation" | "marker_annotation" => {
                    modifiers.annotations.extend(self.annotation(child));
                }
                keyword => {
                    if let Some(flag) = ModifierFlags::from_keyword(keyword) {
                        modifiers.flags.insert(flag);
                    }
                }
            }
        }
        modifiers
    }

    fn type_parameters(&self, node: Node<'_>) -> Vec<Arc<TypeParameterDecl>> {
        let mut parameters = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "type_parameter" {
                continue;
            }
            let mut name = None;
            let mut bounds = Vec::new();
            let mut inner = child.walk();
            for part in child.named_children(&mut inner) {
                match part.kind() {
                    "type_identifier" | "identifier" if name.is_none() => {
                        name = Some(self.text(part).to_string());
                    }
                    "type_bound" => {
                        let mut bound_cursor = part.walk();
                        bounds.extend(
                            part.named_children(&mut bound_cursor)
                                .filter_map(|bound| self.type_expr(bound)),
                        );
                    }
                    _ => {}
                }
            }
            if let Some(name) = name {
                parameters.push(Arc::new(TypeParameterDecl { name, bounds }));
            }
        }
        parameters
    }

    fn first_type(&self, node: Node<'_>) -> Option<Arc<TypeExpr>> {
        let mut cursor = node.walk();
        let ty = node
            .named_children(&mut cursor)
            .find_map(|child| self.type_expr(child));
        ty
    }

    fn type_list_of(&self, node: Node<'_>) -> Vec<Arc<TypeExpr>> {
        let mut cursor = node.walk();
        let Some(list) = node
            .named_children(&mut cursor)
            .find(|child| child.kind() == "type_list")
        else {
            return Vec::new();
        };
        let mut list_cursor = list.walk();
        let types = list
            .named_children(&mut list_cursor)
            .filter_map(|ty| self.type_expr(ty))
            .collect();
        types
    }

    fn type_expr(&self, node: Node<'_>) -> Option<Arc<TypeExpr>> {
        let ty = match node.kind() {
            "integral_type" | "floating_point_type" | "boolean_type" | "void_type" => {
                TypeExpr::Primitive(PrimitiveKind::from_keyword(self.text(node).trim())?)
            }
            "type_identifier" | "identifier" => TypeExpr::ClassRef(self.text(node).to_string()),
            "scoped_type_identifier" => TypeExpr::ClassRef(self.qualified_type_name(node)),
            "generic_type" => {
                let mut name = None;
                let mut arguments = Vec::new();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    match child.kind() {
                        "type_identifier" | "scoped_type_identifier" => {
                            name = Some(self.qualified_type_name(child));
                        }
                        "type_arguments" => {
                            let mut args = child.walk();
                            arguments.extend(
                                child
                                    .named_children(&mut args)
                                    .filter_map(|argument| self.type_expr(argument)),
                            );
                        }
                        _ => {}
                    }
                }
                TypeExpr::Parameterized {
                    name: name?,
                    arguments,
                }
            }
            "array_type" => {
                let element = self.type_expr(node.child_by_field_name("element")?)?;
                let dimensions = node
                    .child_by_field_name("dimensions")
                    .map(|dims| self.dimension_count(dims))
                    .unwrap_or(1);
                return Some(TypeExpr::array_of(element, dimensions));
            }
            "annotated_type" => return self.first_type(node),
            "wildcard" => {
                let mut is_super = false;
                let mut bound = None;
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    match child.kind() {
                        "super" => is_super = true,
                        _ if child.is_named() && bound.is_none() => bound = self.type_expr(child),
                        _ => {}
                    }
                }
                TypeExpr::Wildcard(match bound {
                    None => WildcardBound::Unbounded,
                    Some(bound) if is_super => WildcardBound::Super(bound),
                    Some(bound) => WildcardBound::Extends(bound),
                })
            }
            _ => return None,
        };
        Some(Arc::new(ty))
    }

    /// Dotted name of a (possibly generic) scoped type, dropping inner type arguments.
    fn qualified_type_name(&self, node: Node<'_>) -> String {
        match node.kind() {
            "type_identifier" | "identifier" => self.text(node).to_string(),
            "generic_type" | "scoped_type_identifier" => {
                let mut parts = Vec::new();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if matches!(
                        child.kind(),
                        "type_identifier" | "scoped_type_identifier" | "generic_type"
                    ) {
                        parts.push(self.qualified_type_name(child));
                    }
                }
                parts.join(".")
            }
            _ => self.compact(node),
        }
    }

    fn dimension_count(&self, node: Node<'_>) -> usize {
        self.text(node).matches('[').count()
    }

    fn annotation(&self, node: Node<'_>) -> Option<Arc<AnnotationExpr>> {
        let name = self.compact(node.child_by_field_name("name")?);
        let mut arguments = Vec::new();

        if let Some(list) = node.child_by_field_name("arguments") {
            let mut cursor = list.walk();
            for child in list.named_children(&mut cursor) {
                if child.kind() == "element_value_pair" {
                    let (Some(key), Some(value)) = (
                        child.child_by_field_name("key"),
                        child
                            .child_by_field_name("value")
                            .and_then(|value| self.element_value(value)),
                    ) else {
                        continue;
                    };
                    arguments.push(ElementValuePair {
                        name: self.text(key).to_string(),
                        value,
                    });
                } else if let Some(value) = self.element_value(child) {
                    arguments.push(ElementValuePair {
                        name: "value".to_string(),
                        value,
                    });
                }
            }
        }

        Some(Arc::new(AnnotationExpr { name, arguments }))
    }

    fn element_value(&self, node: Node<'_>) -> Option<ElementValue> {
        let value = match node.kind() {
            "line_comment" | "block_comment" => return None,
            "annotation" | "marker_annotation" => ElementValue::Annotation(self.annotation(node)?),
            "element_value_array_initializer" => {
                let mut cursor = node.walk();
                let elements = node
                    .named_children(&mut cursor)
                    .filter_map(|element| self.element_value(element))
                    .collect();
                ElementValue::Array(elements)
            }
            "class_literal" => match self.first_type(node) {
                Some(ty) => ElementValue::ClassLiteral(ty),
                None => ElementValue::Expression(self.text(node).to_string()),
            },
            "identifier" | "field_access" | "scoped_identifier" => {
                ElementValue::Reference(self.compact(node))
            }
            "parenthesized_expression" => {
                let mut cursor = node.walk();
                let inner = node
                    .named_children(&mut cursor)
                    .find_map(|inner| self.element_value(inner));
                inner?
            }
            "unary_expression" => self.signed_literal(node).unwrap_or_else(|| {
                ElementValue::Expression(self.text(node).to_string())
            }),
            _ => match self.literal(node) {
                Some(literal) => ElementValue::Literal(literal),
                None => ElementValue::Expression(self.text(node).to_string()),
            },
        };
        Some(value)
    }

    fn signed_literal(&self, node: Node<'_>) -> Option<ElementValue> {
        let operator = self.text(node.child_by_field_name("operator")?);
        let operand = self.literal(node.child_by_field_name("operand")?)?;
        let literal = match operator {
            "-" => operand.negate()?,
            "+" => operand,
            _ => return None,
        };
        Some(ElementValue::Literal(literal))
    }

    fn literal(&self, node: Node<'_>) -> Option<Literal> {
        let text = self.text(node);
        match node.kind() {
            "string_literal" => Some(Literal::String(unescape(&string_body(text)))),
            "character_literal" => {
                let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
                unescape(inner).chars().next().map(Literal::Char)
            }
            "true" => Some(Literal::Boolean(true)),
            "false" => Some(Literal::Boolean(false)),
            "null_literal" => Some(Literal::Null),
            "decimal_integer_literal"
            | "hex_integer_literal"
            | "octal_integer_literal"
            | "binary_integer_literal" => parse_integer(text),
            "decimal_floating_point_literal" => parse_float(text),
            _ => None,
        }
    }
}

/// Records get their component fields, accessors and canonical constructor.
fn complete_record(
    name: &str,
    modifiers: &Modifiers,
    components: &[Arc<ParameterDecl>],
    members: &mut Vec<Member>,
) {
    let mut synthesized = Vec::new();

    for component in components {
        synthesized.push(Member::Field(Arc::new(FieldDecl {
            name: component.name.clone(),
            modifiers: Modifiers {
                flags: ModifierFlags::PRIVATE | ModifierFlags::FINAL,
                annotations: component.modifiers.annotations.clone(),
            },
            ty: component.ty.clone(),
            is_enum_constant: false,
            constant: None,
        })));
    }

    for component in components {
        let declared = members.iter().any(|member| {
            matches!(member, Member::Method(method)
                if !method.is_constructor && method.name == component.name && method.parameters.is_empty())
        });
        if !declared {
            synthesized.push(Member::Method(Arc::new(MethodDecl {
                name: component.name.clone(),
                is_constructor: false,
                modifiers: Modifiers {
                    flags: ModifierFlags::PUBLIC,
                    annotations: Vec::new(),
                },
                type_parameters: Vec::new(),
                return_type: Some(component.ty.clone()),
                parameters: Vec::new(),
                has_body: true,
                default_value: None,
            })));
        }
    }

    let has_canonical = members.iter().any(|member| {
        matches!(member, Member::Method(method)
            if method.is_constructor
                && method.parameters.len() == components.len()
                && method.parameters.iter().zip(components).all(|(a, b)| a.ty == b.ty))
    });
    if !has_canonical {
        let mut flags = ModifierFlags::empty();
        for access in [
            ModifierFlags::PUBLIC,
            ModifierFlags::PROTECTED,
            ModifierFlags::PRIVATE,
        ] {
            if modifiers.has(access) {
                flags.insert(access);
            }
        }
        synthesized.push(Member::Method(Arc::new(MethodDecl {
            name: name.to_string(),
            is_constructor: true,
            modifiers: Modifiers {
                flags,
                annotations: Vec::new(),
            },
            type_parameters: Vec::new(),
            return_type: None,
            parameters: components.to_vec(),
            has_body: true,
            default_value: None,
        })));
    }

    synthesized.append(members);
    *members = synthesized;
}

fn string_body(text: &str) -> String {
    if let Some(block) = text
        .strip_prefix("\"\"\"")
        .and_then(|rest| rest.strip_suffix("\"\"\""))
    {
        return strip_text_block_indent(block);
    }
    text.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(text)
        .to_string()
}

fn strip_text_block_indent(block: &str) -> String {
    // Content starts after the line terminator following the opening delimiter.
    let content = block
        .find('\n')
        .map(|index| &block[index + 1..])
        .unwrap_or(block);
    let lines: Vec<&str> = content.split('\n').collect();
    let indent = lines
        .iter()
        .enumerate()
        .filter(|(index, line)| !line.trim().is_empty() || *index == lines.len() - 1)
        .map(|(_, line)| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|line| {
            let stripped = line.get(indent..).unwrap_or("");
            stripped.trim_end()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('s') => out.push(' '),
            Some('\n') => {}
            Some('u') => {
                while chars.peek() == Some(&'u') {
                    chars.next();
                }
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => out.push(char::REPLACEMENT_CHARACTER),
                }
            }
            Some(digit @ '0'..='7') => {
                let mut value = digit.to_digit(8).unwrap_or(0);
                let max_digits = if digit <= '3' { 2 } else { 1 };
                for _ in 0..max_digits {
                    match chars.peek().and_then(|next| next.to_digit(8)) {
                        Some(next) => {
                            value = value * 8 + next;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn parse_integer(text: &str) -> Option<Literal> {
    let cleaned: String = text.chars().filter(|ch| *ch != '_').collect();
    let (digits, is_long) = match cleaned.strip_suffix(|ch| ch == 'l' || ch == 'L') {
        Some(digits) => (digits, true),
        None => (cleaned.as_str(), false),
    };

    let value = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)
    } else if let Some(binary) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        u64::from_str_radix(binary, 2)
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8)
    } else {
        digits.parse::<u64>()
    }
    .ok()?;

    Some(if is_long {
        Literal::Long(value as i64)
    } else {
        Literal::Int(value as u32 as i32)
    })
}

fn parse_float(text: &str) -> Option<Literal> {
    let cleaned: String = text
        .chars()
        .filter(|ch| *ch != '_')
        .collect::<String>()
        .to_ascii_lowercase();
    if let Some(digits) = cleaned.strip_suffix('f') {
        return digits.parse::<f32>().ok().map(Literal::Float);
    }
    let digits = cleaned.strip_suffix('d').unwrap_or(&cleaned);
    digits.parse::<f64>().ok().map(Literal::Double)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn parse(source: &str) -> CompilationUnit {
        JavaParser::new()
            .expect("java grammar")
            .parse_source("Test.java", source)
            .expect("parsed unit")
    }

    const SINGLETON: &str = r#"
package pack;

import pack2.MyAnnotation;
import java.util.*;
import static java.util.Collections.emptyList;

@MyAnnotation(name = "name")
public class Singleton implements java.util.List<String> {
    public static Singleton INSTANCE = new Singleton();

    private Singleton() {}

    private Singleton(String str) {}

    private boolean field = true;

    private Boolean getBooleanField() { return field; }

    @Deprecated private StaticClass getStaticClass() { return new StaticClass(); }

    public UnknownClass getUnknownClass() { return null; }

    private static class StaticClass {}
}
"#;

    #[test]
    fn lowers_package_imports_and_top_level_class() {
        let unit = parse(SINGLETON);
        assert_eq!(unit.package_name(), "pack");
        assert_eq!(unit.syntax_errors, 0);
        assert_eq!(
            unit.imports,
            vec![
                ImportDecl {
                    path: "pack2.MyAnnotation".into(),
                    is_static: false,
                    is_wildcard: false,
                },
                ImportDecl {
                    path: "java.util".into(),
                    is_static: false,
                    is_wildcard: true,
                },
                ImportDecl {
                    path: "java.util.Collections.emptyList".into(),
                    is_static: true,
                    is_wildcard: false,
                },
            ]
        );

        let class = &unit.types[0];
        assert_eq!(class.name, "Singleton");
        assert_eq!(class.kind, ClassKind::Class);
        assert!(class.modifiers.has(ModifierFlags::PUBLIC));
        assert_eq!(class.modifiers.annotations[0].name, "MyAnnotation");
        assert_eq!(
            class.modifiers.annotations[0].arguments,
            vec![ElementValuePair {
                name: "name".into(),
                value: ElementValue::Literal(Literal::String("name".into())),
            }]
        );
        assert!(class.superclass.is_none());
        assert_eq!(class.interfaces.len(), 1);
        assert_eq!(class.interfaces[0].to_string(), "java.util.List<String>");
    }

    #[test]
    fn lowers_members_by_kind() {
        let unit = parse(SINGLETON);
        let class = &unit.types[0];

        let constructors: Vec<_> = class.methods().filter(|m| m.is_constructor).collect();
        assert_eq!(constructors.len(), 2);
        assert!(constructors[0].parameters.is_empty());
        assert_eq!(constructors[1].parameters[0].name, "str");

        let methods: Vec<&str> = class
            .methods()
            .filter(|m| !m.is_constructor)
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(
            methods,
            vec!["getBooleanField", "getStaticClass", "getUnknownClass"]
        );

        let fields: Vec<&str> = class.fields().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["INSTANCE", "field"]);
        let field = class.fields().nth(1).expect("field");
        assert_eq!(field.constant, Some(Literal::Boolean(true)));

        let inner: Vec<&str> = class.inner_classes().map(|c| c.name.as_str()).collect();
        assert_eq!(inner, vec!["StaticClass"]);
    }

    #[test]
    fn lowers_generic_declarations_and_varargs() {
        let unit = parse(
            r#"
package gen;
public interface Mapper<K extends Comparable<K>, V> extends java.util.function.Function<K, V> {
    <R> java.util.Map<? super K, ? extends R> remap(int[] keys, String... rest);
    int[][] grid()[];
}
"#,
        );
        let class = &unit.types[0];
        assert_eq!(class.kind, ClassKind::Interface);
        assert_eq!(class.type_parameters.len(), 2);
        assert_eq!(class.type_parameters[0].name, "K");
        assert_eq!(class.type_parameters[0].bounds[0].to_string(), "Comparable<K>");
        assert_eq!(
            class.interfaces[0].to_string(),
            "java.util.function.Function<K, V>"
        );

        let remap = class.methods().next().expect("remap");
        assert_eq!(remap.type_parameters[0].name, "R");
        assert_eq!(
            remap.return_type.as_ref().map(|ty| ty.to_string()),
            Some("java.util.Map<? super K, ? extends R>".to_string())
        );
        assert_eq!(remap.parameters[0].ty.to_string(), "int[]");
        assert!(remap.parameters[1].is_varargs);
        assert_eq!(remap.parameters[1].ty.to_string(), "String[]");
        assert!(!remap.has_body);

        let grid = class.methods().nth(1).expect("grid");
        assert_eq!(
            grid.return_type.as_ref().map(|ty| ty.to_string()),
            Some("int[][][]".to_string())
        );
    }

    #[test]
    fn lowers_enums_annotations_and_records() {
        let unit = parse(
            r#"
package pack;
enum Color { RED, GREEN; private final int code = 0; Color() {} }
@interface Config {
    String name() default "x";
    int[] sizes() default {1, -2};
    Color color() default Color.RED;
}
record Point(int x, int y) { Point { } }
"#,
        );
        let color = &unit.types[0];
        assert_eq!(color.kind, ClassKind::Enum);
        let constants: Vec<&str> = color
            .fields()
            .filter(|f| f.is_enum_constant)
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(constants, vec!["RED", "GREEN"]);
        assert_eq!(color.fields().count(), 3);

        let config = &unit.types[1];
        assert_eq!(config.kind, ClassKind::Annotation);
        let defaults: Vec<Option<ElementValue>> =
            config.methods().map(|m| m.default_value.clone()).collect();
        assert_eq!(
            defaults,
            vec![
                Some(ElementValue::Literal(Literal::String("x".into()))),
                Some(ElementValue::Array(vec![
                    ElementValue::Literal(Literal::Int(1)),
                    ElementValue::Literal(Literal::Int(-2)),
                ])),
                Some(ElementValue::Reference("Color.RED".into())),
            ]
        );

        let point = &unit.types[2];
        assert_eq!(point.kind, ClassKind::Record);
        let fields: Vec<&str> = point.fields().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["x", "y"]);
        let accessors: Vec<&str> = point
            .methods()
            .filter(|m| !m.is_constructor)
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(accessors, vec!["x", "y"]);
        let constructors: Vec<_> = point.methods().filter(|m| m.is_constructor).collect();
        assert_eq!(constructors.len(), 1);
        assert_eq!(constructors[0].parameters.len(), 2);
    }

    #[test]
    fn counts_syntax_errors_without_failing() {
        let unit = parse("package broken; public class A { int x = ; }");
        assert!(unit.syntax_errors > 0);
        assert_eq!(unit.types.len(), 1);
    }

    #[test]
    fn default_package_has_empty_name() {
        let unit = parse("class Top {}");
        assert_eq!(unit.package, None);
        assert_eq!(unit.package_name(), "");
    }

    #[test_case("42", Literal::Int(42); "decimal")]
    #[test_case("0x7fff_ffff", Literal::Int(i32::MAX); "hex with underscores")]
    #[test_case("0xFFFFFFFF", Literal::Int(-1); "hex wraps")]
    #[test_case("017", Literal::Int(15); "octal")]
    #[test_case("0b101", Literal::Int(5); "binary")]
    #[test_case("10L", Literal::Long(10); "long suffix")]
    fn parses_integer_literals(text: &str, expected: Literal) {
        assert_eq!(parse_integer(text), Some(expected));
    }

    #[test_case("1.5f", Literal::Float(1.5); "float suffix")]
    #[test_case("2.5", Literal::Double(2.5); "plain double")]
    #[test_case("1e3d", Literal::Double(1000.0); "exponent with suffix")]
    fn parses_float_literals(text: &str, expected: Literal) {
        assert_eq!(parse_float(text), Some(expected));
    }

    #[test]
    fn unescapes_java_escapes() {
        assert_eq!(unescape(r#"a\tb\n\"c\"A\101"#), "a\tb\n\"c\"AA");
    }

    #[test]
    fn parse_file_reads_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("Disk.java");
        std::fs::write(&path, "package disk; public final class Disk {}").expect("write source");

        let unit = JavaParser::new()
            .expect("java grammar")
            .parse_file(&path)
            .expect("parsed unit");
        assert_eq!(unit.path, path);
        assert!(unit.types[0].modifiers.has(ModifierFlags::FINAL));
    }
}
