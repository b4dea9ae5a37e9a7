use metatemplate_dom::DomError;
use metatemplate_style::StyleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// A blank proposed name means a marker or rule upstream produced no key.
    #[error("refusing to register a blank dynamic key name (type {key_type})")]
    BlankName { key_type: String },
}

#[derive(Debug, Error)]
pub enum VariableError {
    /// `{{ }}` or `{{ : open }}`.
    #[error("variable {expression:?} has no key name")]
    BlankKey { expression: String },

    /// `{{ isOpen: }}` or `{{ level: a | | b }}`.
    #[error("variable {expression:?} has an empty option")]
    EmptyOption { expression: String },

    #[error("unable to parse attribute value {value:?}: {message}")]
    Syntax { value: String, message: String },

    #[error("variable {expression:?} could not be registered: {source}")]
    Registry {
        expression: String,
        source: RegistryError,
    },
}

#[derive(Debug, Error)]
pub enum AttributeError {
    #[error("duplicate attribute name {key:?}")]
    DuplicateKey { key: String },

    #[error("in attribute {attribute:?}: {source}")]
    Variable {
        attribute: String,
        source: VariableError,
    },

    /// An id-like attribute whose value has no usable identifier in it.
    #[error("{attribute}={value:?} does not contain a usable id")]
    InvalidIdSynonym { attribute: String, value: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Dom(#[from] DomError),
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unknown template format {0:?}")]
    UnknownFormat(String),

    #[error("expected {path:?} to be inside {dirname}/")]
    OutsideFormatDir { path: String, dirname: String },

    /// Logic-less templates cannot compare values.
    #[error("{format} cannot render a comparison on {key:?}")]
    UnsupportedCondition { format: String, key: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Fatal for one template: no output for it is produced.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("template {template_id:?}: {source} in `{snippet}`")]
    Attribute {
        template_id: String,
        snippet: String,
        source: AttributeError,
    },

    #[error("template {template_id:?}: {source}")]
    Format {
        template_id: String,
        source: FormatError,
    },

    #[error("template {template_id:?}: <{tag}> needs a key=\"...\" attribute")]
    MissingKey { template_id: String, tag: String },

    #[error("template {template_id:?}: invalid condition {expression:?}")]
    InvalidCondition {
        template_id: String,
        expression: String,
    },

    #[error(transparent)]
    Style(#[from] StyleError),

    #[error(transparent)]
    Dom(#[from] DomError),
}
