//! Declaration shapes recognized in component and route sources.
//!
//! Every recognizer takes a syntax node and either produces a typed value
//! or an [`Unrecognized`] reason. Callers decide whether an unrecognized
//! shape is worth reporting; none of them treat it as a failure.

use std::fmt;

use tree_sitter::Node;

use crate::parser::node_text;

/// Why a node did not match the shape a recognizer was looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unrecognized {
    /// Expected an object literal, found another node kind
    NotAnObject(String),
    /// Expected an array literal, found another node kind
    NotAnArray(String),
    /// Expected a string literal, found another node kind
    NotAString(String),
    /// Decorator is not a call expression
    NotACall,
    /// Decorator callee is not the one searched for
    OtherDecorator(String),
    /// Decorator call has no object-literal argument
    MissingArgument,
    /// Loader is not a function
    NotAFunction(String),
    /// Loader body does not end in `import(...)`
    NotADynamicImport,
    /// `import(...)` argument is not a string literal
    NonLiteralModulePath,
}

impl fmt::Display for Unrecognized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unrecognized::NotAnObject(kind) => write!(f, "expected object literal, found {}", kind),
            Unrecognized::NotAnArray(kind) => write!(f, "expected array literal, found {}", kind),
            Unrecognized::NotAString(kind) => write!(f, "expected string literal, found {}", kind),
            Unrecognized::NotACall => write!(f, "decorator is not a call"),
            Unrecognized::OtherDecorator(name) => write!(f, "decorator @{}", name),
            Unrecognized::MissingArgument => write!(f, "decorator has no object argument"),
            Unrecognized::NotAFunction(kind) => write!(f, "expected loader function, found {}", kind),
            Unrecognized::NotADynamicImport => write!(f, "loader does not return import()"),
            Unrecognized::NonLiteralModulePath => write!(f, "import() argument is not a string"),
        }
    }
}

// ============================================================================
// Literals
// ============================================================================

/// Named children of a node, skipping comments.
fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Strip the quote delimiters of a literal.
///
/// An unterminated literal from error recovery only loses its opening quote.
fn strip_delimiters(text: &str) -> &str {
    let mut chars = text.chars();
    let Some(open) = chars.next() else {
        return "";
    };
    let rest = chars.as_str();
    if matches!(open, '\'' | '"' | '`') {
        rest.strip_suffix(open).unwrap_or(rest)
    } else {
        rest
    }
}

/// Read a string literal or a substitution-free template literal.
pub fn string_literal(node: Node<'_>, source: &[u8]) -> Result<String, Unrecognized> {
    match node.kind() {
        "string" => Ok(strip_delimiters(node_text(&node, source)).to_string()),
        "template_string" if !has_substitution(node) => {
            Ok(strip_delimiters(node_text(&node, source)).to_string())
        }
        other => Err(Unrecognized::NotAString(other.to_string())),
    }
}

/// Read any string or template literal verbatim, delimiters stripped.
///
/// Substitutions in template literals are kept as written.
pub fn template_literal(node: Node<'_>, source: &[u8]) -> Result<String, Unrecognized> {
    match node.kind() {
        "string" | "template_string" => Ok(strip_delimiters(node_text(&node, source)).to_string()),
        other => Err(Unrecognized::NotAString(other.to_string())),
    }
}

fn has_substitution(node: Node<'_>) -> bool {
    named_children(node)
        .iter()
        .any(|child| child.kind() == "template_substitution")
}

/// Elements of an array literal, skipping comments.
pub fn array_elements<'t>(node: Node<'t>) -> Result<Vec<Node<'t>>, Unrecognized> {
    if node.kind() != "array" {
        return Err(Unrecognized::NotAnArray(node.kind().to_string()));
    }
    Ok(named_children(node))
}

// ============================================================================
// Object Literals
// ============================================================================

/// Keyed properties of an object literal.
///
/// Only `key: value` pairs are kept; shorthand properties, spreads and
/// methods carry no static value to read.
#[derive(Debug, Clone)]
pub struct ObjectLiteral<'t> {
    properties: Vec<(String, Node<'t>)>,
}

impl<'t> ObjectLiteral<'t> {
    /// Recognize an object literal node.
    pub fn parse(node: Node<'t>, source: &[u8]) -> Result<Self, Unrecognized> {
        if node.kind() != "object" {
            return Err(Unrecognized::NotAnObject(node.kind().to_string()));
        }

        let properties = named_children(node)
            .into_iter()
            .filter(|child| child.kind() == "pair")
            .filter_map(|pair| {
                let key = pair.child_by_field_name("key")?;
                let value = pair.child_by_field_name("value")?;
                let key = match key.kind() {
                    "string" => strip_delimiters(node_text(&key, source)).to_string(),
                    _ => node_text(&key, source).to_string(),
                };
                Some((key, value))
            })
            .collect();

        Ok(Self { properties })
    }

    /// Value of the first property with the given key.
    pub fn get(&self, key: &str) -> Option<Node<'t>> {
        self.properties
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| *value)
    }

    /// Property keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(name, _)| name.as_str())
    }
}

// ============================================================================
// Decorators
// ============================================================================

/// Recognize `@<callee>({ ... })` and return its object-literal argument.
///
/// `@ng.Component({...})` matches too: the last segment of a member
/// expression callee is compared.
pub fn decorator_config<'t>(
    decorator: Node<'t>,
    source: &[u8],
    callee: &str,
) -> Result<ObjectLiteral<'t>, Unrecognized> {
    let call = named_children(decorator)
        .into_iter()
        .next()
        .filter(|child| child.kind() == "call_expression")
        .ok_or(Unrecognized::NotACall)?;

    let function = call
        .child_by_field_name("function")
        .ok_or(Unrecognized::NotACall)?;
    let name = match function.kind() {
        "member_expression" => function
            .child_by_field_name("property")
            .map(|p| node_text(&p, source))
            .unwrap_or(""),
        _ => node_text(&function, source),
    };
    if name != callee {
        return Err(Unrecognized::OtherDecorator(name.to_string()));
    }

    let arguments = call
        .child_by_field_name("arguments")
        .ok_or(Unrecognized::MissingArgument)?;
    let first = named_children(arguments)
        .into_iter()
        .next()
        .ok_or(Unrecognized::MissingArgument)?;

    ObjectLiteral::parse(first, source)
}

// ============================================================================
// Route Descriptors
// ============================================================================

/// One element of a route list.
#[derive(Debug, Clone)]
pub struct RouteDescriptor<'t> {
    /// `path: '...'`, informational only
    pub path: Option<String>,
    /// `loadComponent: ...`, when present
    pub loader: Option<Result<String, Unrecognized>>,
    /// `component: SomeComponent`, when present
    pub component: Option<String>,
    /// Elements of `children: [...]`
    pub children: Vec<Node<'t>>,
}

impl<'t> RouteDescriptor<'t> {
    /// Recognize a route descriptor object literal.
    pub fn parse(node: Node<'t>, source: &[u8]) -> Result<Self, Unrecognized> {
        let object = ObjectLiteral::parse(node, source)?;

        let path = object
            .get("path")
            .and_then(|value| string_literal(value, source).ok());
        let loader = object
            .get("loadComponent")
            .map(|value| lazy_loader(value, source));
        let component = object
            .get("component")
            .filter(|value| value.kind() == "identifier")
            .map(|value| node_text(&value, source).to_string());
        let children = object
            .get("children")
            .and_then(|value| array_elements(value).ok())
            .unwrap_or_default();

        Ok(Self {
            path,
            loader,
            component,
            children,
        })
    }
}

/// Recognize a lazy component loader and return its module path.
///
/// Accepted forms:
/// - `() => import('./x')`
/// - `() => import('./x').then(m => m.X)`
/// - `function () { return import('./x'); }`
pub fn lazy_loader(node: Node<'_>, source: &[u8]) -> Result<String, Unrecognized> {
    let body = match node.kind() {
        "arrow_function" | "function_expression" | "function" => node
            .child_by_field_name("body")
            .ok_or(Unrecognized::NotADynamicImport)?,
        other => return Err(Unrecognized::NotAFunction(other.to_string())),
    };

    let mut expression = if body.kind() == "statement_block" {
        returned_expression(body).ok_or(Unrecognized::NotADynamicImport)?
    } else {
        body
    };

    loop {
        match expression.kind() {
            "parenthesized_expression" | "await_expression" => {
                expression = named_children(expression)
                    .into_iter()
                    .next()
                    .ok_or(Unrecognized::NotADynamicImport)?;
            }
            "call_expression" => {
                let function = expression
                    .child_by_field_name("function")
                    .ok_or(Unrecognized::NotADynamicImport)?;
                match function.kind() {
                    "import" => return import_argument(expression, source),
                    // `.then(...)` chained on the import
                    "member_expression" => {
                        expression = function
                            .child_by_field_name("object")
                            .ok_or(Unrecognized::NotADynamicImport)?;
                    }
                    _ => return Err(Unrecognized::NotADynamicImport),
                }
            }
            _ => return Err(Unrecognized::NotADynamicImport),
        }
    }
}

fn returned_expression(block: Node<'_>) -> Option<Node<'_>> {
    named_children(block)
        .into_iter()
        .find(|statement| statement.kind() == "return_statement")
        .and_then(|statement| named_children(statement).into_iter().next())
}

fn import_argument(call: Node<'_>, source: &[u8]) -> Result<String, Unrecognized> {
    let arguments = call
        .child_by_field_name("arguments")
        .ok_or(Unrecognized::NonLiteralModulePath)?;
    let first = named_children(arguments)
        .into_iter()
        .next()
        .ok_or(Unrecognized::NonLiteralModulePath)?;
    string_literal(first, source).map_err(|_| Unrecognized::NonLiteralModulePath)
}
