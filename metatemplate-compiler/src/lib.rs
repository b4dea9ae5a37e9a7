//! Compiles one canonical HTML + CSS template into several output formats.
//!
//! Attribute values may carry `{{ key }}` markers. Each marker becomes a
//! dynamic key in the format's [`registry::DynamicKeyRegistry`], the tag
//! ruleset adds the keys an author would expect for that element, and every
//! [`formats::TemplateFormat`] renders the same attributes in its own syntax.
//!
//! ```text
//! <div class="g-flex-row {{ isReversed?: g-flex-reverse }}">
//! ```
//!
//! becomes `{{#isReversed}} g-flex-reverse{{/isReversed}}` in Mustache and
//! a `props.isReversed` condition in a styled component.

pub mod attributes;
pub mod error;
pub mod formats;
pub mod preview;
pub mod registry;
pub mod ruleset;
pub mod types;
pub mod variable;
pub mod walker;

pub use attributes::{compile_attributes, data_type_for};
pub use error::{AttributeError, CompileError, FormatError, RegistryError, VariableError};
pub use formats::{
    ComponentOptions, CssStrategy, Dialect, FileMap, Format, FormatId, Language, Lookup, TemplateFormat,
    apply_lookup,
};
pub use preview::{preview_template, render_preview};
pub use registry::DynamicKeyRegistry;
pub use types::{DynamicKey, DynamicKeyType, EnumOption, NamedType, Template, TemplateAttribute};
pub use walker::{CompileOptions, FormatOutput, make_index, make_templates};
