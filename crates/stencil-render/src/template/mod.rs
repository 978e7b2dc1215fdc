//! Template resolution, compilation and rendering.
//!
//! Templates are MiniJinja templates stored as `*.tpl` files. A record's
//! columns and the run's global variables are available as top-level names:
//!
//! ```jinja
//! hostname {{ hostname }}
//! interface Loopback0
//!  ip address {{ ip4(loopback, 0) }} {{ ip4mask(loopback) }}
//! ntp server {{ ntp_server }}
//! ```
//!
//! ## Pipeline
//!
//! 1. [`TemplateRegistry`] locates the source for a name (inline → directories)
//! 2. [`TemplateCache`] compiles each name once per run
//! 3. [`render`] merges record and globals and renders
//!
//! ## Functions
//!
//! See [`FunctionTable`] for `split`, `ip4`, `ip4mask`, `ip4cidr`,
//! `ip4mask_to_cidr` and `ip4cidr_to_mask`.

mod cache;
mod engine;
pub mod functions;
pub mod registry;

pub use cache::{CompiledTemplate, TemplateCache};
pub use engine::{build_environment, merge_context, render, MissingKeyPolicy, NO_VALUE};
pub use functions::{FunctionTable, TemplateFunction};
pub use registry::{
    template_file_name, RegistryError, ResolvedTemplate, TemplateRegistry, TEMPLATE_EXTENSION,
};
