use std::fmt;

/// One type occurrence in a method signature or declaration body.
///
/// Consumers match this exhaustively. Adding a variant is a breaking change
/// for every type renderer, which is the point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    String,
    Integer,
    Double,
    Float,
    Boolean,
    Void,
    Null,
    Any,
    Date,
    Array(Box<Node>),
    Map { key: Box<Node>, value: Box<Node> },
    Promise(Box<Node>),
    Union(Vec<Node>),
    /// A resolved reference to a [`Declaration`](crate::Declaration) by name.
    NamedReference(TypeRef),
    /// An inline anonymous record shape.
    TypeLiteral(Vec<PropertyDefinition>),
}

/// Points at a declaration by its dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef {
    pub name: String,
    pub declaring_path: String,
    pub kind: RefKind,
}

/// What kind of declaration a [`TypeRef`] points at. Renderers need this to
/// decide between value and record handling without a declaration lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefKind {
    Enum,
    Alias,
    Struct,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyDefinition {
    pub name: String,
    pub optional: bool,
    pub ty: Node,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>, ty: Node) -> Self {
        Self {
            name: name.into(),
            optional: false,
            ty,
        }
    }

    pub fn optional(name: impl Into<String>, ty: Node) -> Self {
        Self {
            name: name.into(),
            optional: true,
            ty,
        }
    }

    /// Required properties first, then optional ones, each group in
    /// declaration order. Constructor parameter lists must use this.
    pub fn required_first(props: &[PropertyDefinition]) -> Vec<&PropertyDefinition> {
        let mut ordered: Vec<&PropertyDefinition> = props.iter().filter(|p| !p.optional).collect();
        ordered.extend(props.iter().filter(|p| p.optional));
        ordered
    }
}

impl Node {
    pub fn array(inner: Node) -> Self {
        Node::Array(Box::new(inner))
    }

    pub fn promise(inner: Node) -> Self {
        Node::Promise(Box::new(inner))
    }

    pub fn map(key: Node, value: Node) -> Self {
        Node::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn reference(
        name: impl Into<String>,
        declaring_path: impl Into<String>,
        kind: RefKind,
    ) -> Self {
        Node::NamedReference(TypeRef {
            name: name.into(),
            declaring_path: declaring_path.into(),
            kind,
        })
    }

    /// Strips one level of `Promise`. Return types of async methods are
    /// rendered through this by targets where async-ness lives at the call
    /// site.
    pub fn awaited(&self) -> &Node {
        match self {
            Node::Promise(inner) => inner,
            other => other,
        }
    }

    /// For `T | null` (any number of `null` members, exactly one other
    /// member) returns `T`.
    pub fn nullable_inner(&self) -> Option<&Node> {
        let Node::Union(params) = self else {
            return None;
        };
        let mut rest = params.iter().filter(|p| !matches!(p, Node::Null));
        let first = rest.next()?;
        if rest.next().is_some() || params.len() == 1 {
            return None;
        }
        Some(first)
    }

    /// Calls `f` for every named reference reachable inside this node,
    /// without following references into their declarations.
    pub fn visit_references<'a>(&'a self, f: &mut impl FnMut(&'a TypeRef)) {
        match self {
            Node::String
            | Node::Integer
            | Node::Double
            | Node::Float
            | Node::Boolean
            | Node::Void
            | Node::Null
            | Node::Any
            | Node::Date => {}
            Node::Array(inner) | Node::Promise(inner) => inner.visit_references(f),
            Node::Map { key, value } => {
                key.visit_references(f);
                value.visit_references(f);
            }
            Node::Union(params) => {
                for p in params {
                    p.visit_references(f);
                }
            }
            Node::NamedReference(r) => f(r),
            Node::TypeLiteral(props) => {
                for p in props {
                    p.ty.visit_references(f);
                }
            }
        }
    }

    /// Like [`Node::visit_references`], with mutable access.
    pub fn visit_references_mut(&mut self, f: &mut impl FnMut(&mut TypeRef)) {
        match self {
            Node::String
            | Node::Integer
            | Node::Double
            | Node::Float
            | Node::Boolean
            | Node::Void
            | Node::Null
            | Node::Any
            | Node::Date => {}
            Node::Array(inner) | Node::Promise(inner) => inner.visit_references_mut(f),
            Node::Map { key, value } => {
                key.visit_references_mut(f);
                value.visit_references_mut(f);
            }
            Node::Union(params) => {
                for p in params {
                    p.visit_references_mut(f);
                }
            }
            Node::NamedReference(r) => f(r),
            Node::TypeLiteral(props) => {
                for p in props {
                    p.ty.visit_references_mut(f);
                }
            }
        }
    }

    pub fn references(&self) -> Vec<&TypeRef> {
        let mut out = Vec::new();
        self.visit_references(&mut |r| out.push(r));
        out
    }
}

// ============================================================================
// Canonical spelling
// ============================================================================

/// TypeScript-like spelling, used as the raw type string in summaries.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::String => f.write_str("string"),
            Node::Integer => f.write_str("integer"),
            Node::Double => f.write_str("number"),
            Node::Float => f.write_str("float"),
            Node::Boolean => f.write_str("boolean"),
            Node::Void => f.write_str("void"),
            Node::Null => f.write_str("null"),
            Node::Any => f.write_str("any"),
            Node::Date => f.write_str("Date"),
            Node::Array(inner) => match inner.as_ref() {
                Node::Union(_) => write!(f, "({inner})[]"),
                _ => write!(f, "{inner}[]"),
            },
            Node::Map { key, value } => write!(f, "{{ [key: {key}]: {value} }}"),
            Node::Promise(inner) => write!(f, "Promise<{inner}>"),
            Node::Union(params) => {
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{p}")?;
                }
                Ok(())
            }
            Node::NamedReference(r) => f.write_str(&r.name),
            Node::TypeLiteral(props) => {
                if props.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, p) in props.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    let q = if p.optional { "?" } else { "" };
                    write!(f, "{}{q}: {}", p.name, p.ty)?;
                }
                f.write_str(" }")
            }
        }
    }
}
