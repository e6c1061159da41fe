//! Renderer configuration.
//!
//! Configuration is an explicit value handed to [`Renderer::new`](crate::renderer::Renderer::new).
//! There is no global config: two renderers in the same thread can run with
//! different checks enabled.
//!
//! # Example
//!
//! ```ignore
//! use spark_vdom::config::{Checks, Config};
//!
//! let config = Config::default().with_checks(Checks::ELEMENT_TRACING);
//! let renderer = Renderer::new(config);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::error::ReconcileError;

bitflags::bitflags! {
    /// Optional runtime checks. All are off by default.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Checks: u8 {
        const NONE = 0;
        /// Report where a failing element was created.
        const ELEMENT_TRACING = 1 << 0;
        /// Verify dispatcher contracts on every mount and update.
        const INTERNAL_TYPE_CHECKS = 1 << 1;
        /// Run component prop validators before rendering.
        const PROP_VALIDATION = 1 << 2;
    }
}

/// Receives errors raised inside binding callbacks.
///
/// Binding callbacks fire from `BindingSetter::set`, outside any mount or
/// update call, so there is no caller to return the error to.
pub type BindingErrorHook = Rc<dyn Fn(&ReconcileError)>;

/// Placeholder reported instead of an element's creation site when
/// [`Checks::ELEMENT_TRACING`] is off.
pub const TRACING_DISABLED_MESSAGE: &str =
    "<enable element tracing for the creation site of this element>";

/// Configuration for a [`Renderer`](crate::renderer::Renderer).
#[derive(Clone)]
pub struct Config {
    pub checks: Checks,
    pub on_binding_error: BindingErrorHook,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            checks: Checks::NONE,
            on_binding_error: Rc::new(|error| {
                log::error!("{error}");
            }),
        }
    }
}

impl Config {
    /// Every check enabled.
    pub fn development() -> Self {
        Self::default().with_checks(Checks::all())
    }

    pub fn with_checks(mut self, checks: Checks) -> Self {
        self.checks = checks;
        self
    }

    pub fn with_binding_error_hook(mut self, hook: impl Fn(&ReconcileError) + 'static) -> Self {
        self.on_binding_error = Rc::new(hook);
        self
    }

    #[inline]
    pub fn element_tracing(&self) -> bool {
        self.checks.contains(Checks::ELEMENT_TRACING)
    }

    #[inline]
    pub fn internal_type_checks(&self) -> bool {
        self.checks.contains(Checks::INTERNAL_TYPE_CHECKS)
    }

    #[inline]
    pub fn prop_validation(&self) -> bool {
        self.checks.contains(Checks::PROP_VALIDATION)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config").field("checks", &self.checks).finish_non_exhaustive()
    }
}
