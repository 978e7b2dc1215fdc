//! # Stencil Render - Data-Driven Text Generation
//!
//! `stencil-render` turns rows of delimited data into text files. Each row
//! picks a template and an output name through two of its columns; the
//! template is rendered against the row's values plus a set of run-wide
//! variables, and the result is written, appended or skipped depending on
//! what the run has already done with that output.
//!
//! It is the engine behind the `stencil` command, and was written for
//! generating per-device network configuration, hence the IPv4 helpers.
//!
//! ## Core Concepts
//!
//! - [`load_records`]: CSV to [`Record`]s, UTF-8 checked, values normalized to ASCII
//! - [`TemplateRegistry`]: where template sources live (`*.tpl`)
//! - [`TemplateCache`]: compile-once cache and the render environment
//! - [`MissingKeyPolicy`]: what an absent key renders as
//! - [`OutputRouter`]: create / append / skip decisions per output path
//! - [`Generator`]: drives records through the cache and the router
//! - [`netaddr`]: `split` and the IPv4 helpers, also available to templates
//!
//! ## Quick Start
//!
//! ```rust
//! use stencil_render::{
//!     load_records, GlobalVars, MissingKeyPolicy, TemplateCache, TemplateRegistry,
//! };
//!
//! let csv = "template,output,host,loopback\ncore,r1,Kraków-1,10.0.0.1/32\n";
//! let records = load_records(csv.as_bytes(), ',').unwrap();
//! assert_eq!(records[0].get("host"), Some("Krakow-1"));
//!
//! let mut registry = TemplateRegistry::new();
//! registry.add_inline(
//!     "core",
//!     "hostname {{ host }}\nip {{ ip4(loopback, 0) }} {{ loopback | ip4mask }}\n",
//! );
//!
//! let mut cache = TemplateCache::new(registry, MissingKeyPolicy::default());
//! let template = cache.resolve("core").unwrap();
//! let text = stencil_render::render(&template, &records[0], &GlobalVars::new()).unwrap();
//! assert_eq!(text, "hostname Krakow-1\nip 10.0.0.1 255.255.255.255\n");
//! ```
//!
//! ## IPv4 Helpers
//!
//! ```rust
//! use stencil_render::netaddr;
//!
//! assert_eq!(netaddr::ip4("10.0.0.0", 256).unwrap(), "10.0.1.0");
//! assert_eq!(netaddr::ip4mask("192.168.1.0/24").unwrap(), "255.255.255.0");
//! assert_eq!(netaddr::ip4mask_to_cidr("255.255.240.0").unwrap(), "20");
//! assert_eq!(netaddr::split("10.0.0.0/24", "/", 2), "");
//! ```

mod data;
mod error;
mod generator;
pub mod netaddr;
mod router;
mod summary;
pub mod template;
mod text;

pub use error::{Error, FuncError, RecordError};

pub use data::{delimiter_byte, load_records, load_records_from_path, GlobalVars, Record};

pub use text::{decode_utf8, normalize, strip_bom, UTF8_BOM};

pub use template::{
    render, template_file_name, CompiledTemplate, FunctionTable, MissingKeyPolicy, RegistryError,
    ResolvedTemplate, TemplateCache, TemplateRegistry, NO_VALUE, TEMPLATE_EXTENSION,
};

pub use router::{
    OutputRouter, OutputTarget, RouteOutcome, TargetLayout, TargetState,
    DEFAULT_OUTPUT_EXTENSION, GENERATED_EXTENSIONS,
};

pub use generator::{FailurePolicy, GenerateOptions, Generator};

pub use summary::{FailureReport, RunSummary};
