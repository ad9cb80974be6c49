//! Runtime type identity with a readable rendering.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The runtime identity of a type together with its name for diagnostics.
#[derive(Clone, Copy)]
pub struct Shape {
    id: TypeId,
    name: &'static str,
}

impl Shape {
    /// Shape of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Shape of `()`, recorded for slots inserted without metadata.
    pub fn empty() -> Self {
        Self::of::<()>()
    }

    /// Whether this is the shape of `()`.
    pub fn is_empty(&self) -> bool {
        self.id == TypeId::of::<()>()
    }

    /// Underlying type identity.
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Full path name as reported by the compiler.
    pub fn raw_name(&self) -> &'static str {
        self.name
    }

    /// Name with module paths stripped, e.g. `(i32, String)`.
    pub fn render(&self) -> String {
        render_type_name(self.name)
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Shape {}

impl Hash for Shape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({})", self.render())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Strip module paths from a compiler type name.
///
/// `alloc::sync::Arc<alloc::string::String>` becomes `Arc<String>`. Falls
/// back to the input if stripping would leave nothing.
pub fn render_type_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut segment_start = 0;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
            continue;
        }
        out.push(c);
        if !(c.is_alphanumeric() || c == '_') {
            segment_start = out.len();
        }
    }

    if out.is_empty() {
        raw.to_string()
    } else {
        out
    }
}
