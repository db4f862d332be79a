//! Viewmodel contracts.
//!
//! A [`ViewModel`] is a disposable unit of UI state with no knowledge of how it
//! is rendered. A [`WindowViewModel`] additionally names the visual template
//! that presents it and exposes a close-request signal its owner listens to.
//!
//! Viewmodels are shared as `Rc<dyn ViewModel>` / `Rc<dyn WindowViewModel>`
//! and compared by instance identity ([`ViewModelKey`]), never by value.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::signal::Signal;

// ---------------------------------------------------------------------------
// Downcasting support
// ---------------------------------------------------------------------------

/// Conversion to `Rc<dyn Any>`, implemented for every `'static` type.
///
/// This is what lets a typed binder recover its concrete viewmodel from an
/// `Rc<dyn ViewModel>`.
pub trait AsAny: Any {
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

// ---------------------------------------------------------------------------
// ViewModel / WindowViewModel
// ---------------------------------------------------------------------------

/// Abstract disposable unit of UI state.
pub trait ViewModel: AsAny {
    /// Release whatever the viewmodel holds. Must be idempotent.
    fn dispose(&self);
}

/// A viewmodel shown in its own window, alongside other open windows.
pub trait WindowViewModel: ViewModel {
    /// Stable identifier naming the visual template for this window.
    fn id(&self) -> &str;

    /// Fired by the viewmodel's own logic to ask its owner to close it.
    fn close_requested(&self) -> &Signal<()>;
}

/// Recover the concrete type behind a screen viewmodel.
pub fn downcast_view_model<V: ViewModel>(view_model: Rc<dyn ViewModel>) -> Option<Rc<V>> {
    view_model.into_any_rc().downcast::<V>().ok()
}

/// Recover the concrete type behind a window viewmodel.
pub fn downcast_window<V: WindowViewModel>(window: Rc<dyn WindowViewModel>) -> Option<Rc<V>> {
    window.into_any_rc().downcast::<V>().ok()
}

// ---------------------------------------------------------------------------
// ViewModelKey
// ---------------------------------------------------------------------------

/// Instance identity of a shared viewmodel.
///
/// Two keys are equal only when they come from the same allocation, so two
/// windows with the same template id are still distinct. A key is meaningful
/// only while some `Rc` to the instance is alive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewModelKey(usize);

impl ViewModelKey {
    pub fn of<V: ?Sized>(view_model: &Rc<V>) -> Self {
        Self(Rc::as_ptr(view_model) as *const () as usize)
    }
}

impl fmt::Debug for ViewModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewModelKey({:#x})", self.0)
    }
}

// ---------------------------------------------------------------------------
// DisposeFlag
// ---------------------------------------------------------------------------

/// One-way flag for implementing idempotent `dispose`.
#[derive(Debug, Default)]
pub struct DisposeFlag(Cell<bool>);

impl DisposeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark as disposed. Returns `true` only on the first call.
    pub fn mark(&self) -> bool {
        !self.0.replace(true)
    }

    pub fn is_disposed(&self) -> bool {
        self.0.get()
    }
}

// ---------------------------------------------------------------------------
// WindowState
// ---------------------------------------------------------------------------

/// Reusable core of a window viewmodel: id, close signal and dispose flag.
///
/// Embed it and forward [`WindowViewModel::id`],
/// [`WindowViewModel::close_requested`] and [`ViewModel::dispose`] to it.
/// Disposing closes the signal, so close requests made after disposal reach
/// nobody.
#[derive(Debug)]
pub struct WindowState {
    id: String,
    close_requested: Signal<()>,
    disposed: DisposeFlag,
}

impl WindowState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            close_requested: Signal::new(),
            disposed: DisposeFlag::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn close_requested(&self) -> &Signal<()> {
        &self.close_requested
    }

    /// Ask the owner to close this window.
    pub fn request_close(&self) {
        self.close_requested.emit(&());
    }

    /// Close the signal. Returns `true` only on the first call.
    pub fn dispose(&self) -> bool {
        if !self.disposed.mark() {
            return false;
        }
        self.close_requested.close();
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.is_disposed()
    }
}
