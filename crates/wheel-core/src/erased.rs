//! Type-erased value paired with its shape.

use std::any::Any;
use std::fmt;

use crate::shape::Shape;

/// A value of any `Send + Sync` type, tagged with its runtime shape.
pub struct Erased {
    value: Box<dyn Any + Send + Sync>,
    shape: Shape,
}

impl Erased {
    /// Erase `value`, recording its shape.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Box::new(value),
            shape: Shape::of::<T>(),
        }
    }

    /// The `()` value, used for slots without metadata.
    pub fn empty() -> Self {
        Self::new(())
    }

    /// Shape of the held value.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Whether the held value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrow the value as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Mutably borrow the value as a `T`.
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut::<T>()
    }
}

impl fmt::Debug for Erased {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Erased").field("shape", &self.shape).finish()
    }
}
