//! Pluggable JSON Schema validation
//!
//! Task results, elicitation responses and tool/prompt arguments can all be
//! checked against a JSON Schema before they leave or enter the engine.
//! Which schema library does the checking is a receiver choice, not
//! something the core should hard-wire — this module defines the seam and,
//! behind the `json-schema-validator` feature, a default backed by the
//! `jsonschema` crate.

use serde_json::Value;
use crate::error::{Error, ErrorCode};

/// A compiled schema that can validate JSON values against it.
pub trait CompiledSchema: Send + Sync {
    fn validate(&self, instance: &Value) -> Result<(), Error>;
}

/// Compiles raw JSON Schema documents into reusable [`CompiledSchema`]s.
pub trait SchemaValidator: Send + Sync {
    fn compile(&self, schema: &Value) -> Result<Box<dyn CompiledSchema>, Error>;
}

#[cfg(feature = "json-schema-validator")]
pub use jsonschema_backend::JsonSchemaValidator;

#[cfg(feature = "json-schema-validator")]
mod jsonschema_backend {
    use super::*;

    /// Default [`SchemaValidator`], backed by the `jsonschema` crate.
    #[derive(Default)]
    pub struct JsonSchemaValidator;

    struct Compiled(jsonschema::Validator);

    impl CompiledSchema for Compiled {
        fn validate(&self, instance: &Value) -> Result<(), Error> {
            match self.0.validate(instance) {
                Ok(()) => Ok(()),
                Err(error) => Err(Error::new(ErrorCode::InvalidParams, error.to_string())),
            }
        }
    }

    impl SchemaValidator for JsonSchemaValidator {
        fn compile(&self, schema: &Value) -> Result<Box<dyn CompiledSchema>, Error> {
            let validator = jsonschema::validator_for(schema)
                .map_err(|error| Error::new(ErrorCode::InvalidParams, error.to_string()))?;
            Ok(Box::new(Compiled(validator)))
        }
    }

}
