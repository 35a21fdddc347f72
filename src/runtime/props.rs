//! Prop Value - Reactive property wrapper.
//!
//! Binder props can be:
//! - Static values: `initial: 3.into()`
//! - Signals: `initial: count_signal.into()` (re-read on every render)
//! - Getters: `PropValue::getter(move || compute())`
//!
//! Props are read during mount and again on every re-render. Whether a
//! change matters is decided by the binder's keyed setup, not here.

use std::fmt;
use std::rc::Rc;

use spark_signals::Signal;

use crate::store::ComponentValue;

/// A property value that can be static, a signal, or a getter.
#[derive(Clone)]
pub enum PropValue<T: Clone + PartialEq + 'static> {
    /// Static value (not reactive).
    Static(T),
    /// Reactive signal.
    Signal(Signal<T>),
    /// Getter function (called each time value is needed).
    Getter(Rc<dyn Fn() -> T>),
}

impl<T: Clone + PartialEq + 'static> PropValue<T> {
    /// Get the current value.
    pub fn get(&self) -> T {
        match self {
            PropValue::Static(v) => v.clone(),
            PropValue::Signal(s) => s.get(),
            PropValue::Getter(f) => f(),
        }
    }

    /// Wrap a getter closure.
    pub fn getter(f: impl Fn() -> T + 'static) -> Self {
        PropValue::Getter(Rc::new(f))
    }

    /// True for static values.
    pub fn is_static(&self) -> bool {
        matches!(self, PropValue::Static(_))
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for PropValue<T> {
    fn default() -> Self {
        PropValue::Static(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> From<T> for PropValue<T> {
    fn from(value: T) -> Self {
        PropValue::Static(value)
    }
}

impl<T: Clone + PartialEq + 'static> From<Signal<T>> for PropValue<T> {
    fn from(signal: Signal<T>) -> Self {
        PropValue::Signal(signal)
    }
}

impl From<&str> for PropValue<String> {
    fn from(value: &str) -> Self {
        PropValue::Static(value.to_string())
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for PropValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Static(v) => f.debug_tuple("Static").field(v).finish(),
            PropValue::Signal(_) => f.write_str("Signal(..)"),
            PropValue::Getter(_) => f.write_str("Getter(..)"),
        }
    }
}

/// Shorthand for a static component value prop.
pub fn value<T: std::any::Any>(value: T) -> PropValue<ComponentValue> {
    PropValue::Static(ComponentValue::new(value))
}
