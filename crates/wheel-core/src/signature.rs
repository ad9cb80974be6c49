//! Callback signatures.
//!
//! An event's signature is the tuple of its callback parameter types, for
//! example `(i32, String)` for callbacks taking `(i32, String)`. The tuple is
//! what `emit` receives and what each callback is handed a clone of.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let event = Event::new::<(i32, String)>("changed");
//! event.insert(|n: i32, s: String| println!("{n} {s}"), 0)?;
//! event.emit((7, "seven".to_string()))?;
//! ```

use std::sync::Arc;

use crate::handle::Handle;
use crate::shape::{render_type_name, Shape};

/// Stored form of a callback.
pub type Callback<S> = Arc<dyn Fn(S) + Send + Sync>;

/// Stored form of an interceptor. Receives the handle being bound, the
/// original callback and the emitted arguments.
pub type Interceptor<S> = Arc<dyn Fn(&Handle, &Callback<S>, S) + Send + Sync>;

/// Insert and remove hook.
pub type Hook = Arc<dyn Fn(&Handle) + Send + Sync>;

/// Parameter tuple of a callback signature.
pub trait Signature: Clone + Send + Sync + 'static {
    /// Compiler names of each parameter type.
    fn param_names() -> Vec<&'static str>;

    /// Shape of the parameter tuple.
    fn shape() -> Shape {
        Shape::of::<Self>()
    }

    /// Shape of the matching [`Interceptor`].
    fn interceptor_shape() -> Shape {
        Shape::of::<Interceptor<Self>>()
    }

    /// Parameter list for diagnostics, e.g. `i32, String`.
    fn params() -> String {
        Self::param_names()
            .into_iter()
            .map(render_type_name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Callback type for diagnostics, e.g. `fn(i32, String)`.
    fn describe() -> String {
        format!("fn({})", Self::params())
    }

    /// Interceptor type for diagnostics.
    fn describe_interceptor() -> String {
        let params = Self::params();
        if params.is_empty() {
            format!("fn(&Handle, &Callback<{}>)", Self::describe())
        } else {
            format!("fn(&Handle, &Callback<{}>, {})", Self::describe(), params)
        }
    }
}

/// Anything that can be stored as a callback of signature `S`.
///
/// Implemented for closures and functions taking the tuple's elements as
/// separate arguments.
pub trait Listener<S: Signature>: Send + Sync + 'static {
    /// Convert into the stored callback form.
    fn into_callback(self) -> Callback<S>;
}

macro_rules! impl_signature {
    ($($ty:ident $arg:ident),*) => {
        impl<$($ty,)*> Signature for ($($ty,)*)
        where
            $($ty: Clone + Send + Sync + 'static,)*
        {
            fn param_names() -> Vec<&'static str> {
                vec![$(std::any::type_name::<$ty>(),)*]
            }
        }

        impl<Func, $($ty,)*> Listener<($($ty,)*)> for Func
        where
            Func: Fn($($ty,)*) + Send + Sync + 'static,
            $($ty: Clone + Send + Sync + 'static,)*
        {
            fn into_callback(self) -> Callback<($($ty,)*)> {
                Arc::new(move |($($arg,)*): ($($ty,)*)| (self)($($arg,)*))
            }
        }
    };
}

impl_signature!();
impl_signature!(A a);
impl_signature!(A a, B b);
impl_signature!(A a, B b, C c);
impl_signature!(A a, B b, C c, D d);
impl_signature!(A a, B b, C c, D d, E e);
impl_signature!(A a, B b, C c, D d, E e, F f);
impl_signature!(A a, B b, C c, D d, E e, F f, G g);
impl_signature!(A a, B b, C c, D d, E e, F f, G g, H h);
