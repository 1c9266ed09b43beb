//! Type resolution for nested-record fields.
//!
//! Most descriptors point at a concrete [`RecordKind`]. A field can also name
//! its target type ([`TypeRef::Named`]); this is how a record refers to itself
//! (`Message.reply_to_message`) before its own kind is usable in a constant.
//! Names are resolved against the closed set of registered records:
//!
//! | Name | Strategy |
//! |------|----------|
//! | a registered record (`"Message"`) | decode as that record |
//! | a primitive scalar (`"int"`, `"str"`, …) | pass through unchanged |
//! | anything else | [`MarshalError::TypeResolution`] |

use tracing::debug;

use super::TypeRef;
use crate::error::{MarshalError, MarshalResult};
use crate::types::RecordKind;

/// Primitive type names accepted as passthrough targets.
const SCALAR_NAMES: &[&str] = &[
    "bool", "int", "float", "str", "i32", "i64", "f64", "String", "Value",
];

/// How a nested field's raw value is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Decode the sub-mapping as the given record.
    Record(RecordKind),
    /// Keep the raw JSON value.
    Passthrough,
}

/// Resolves [`TypeRef`]s to conversion strategies.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeResolver;

impl TypeResolver {
    /// Resolves a type name, `None` when nothing matches.
    pub fn resolve_name(name: &str) -> Option<Strategy> {
        if let Some(kind) = RecordKind::from_name(name) {
            return Some(Strategy::Record(kind));
        }
        SCALAR_NAMES.contains(&name).then_some(Strategy::Passthrough)
    }

    /// Resolves the target of `record.field`.
    pub fn resolve(
        record: &'static str,
        field: &'static str,
        target: TypeRef,
    ) -> MarshalResult<Strategy> {
        match target {
            TypeRef::Kind(kind) => Ok(Strategy::Record(kind)),
            TypeRef::Named(type_name) => {
                Self::resolve_name(type_name).ok_or(MarshalError::TypeResolution {
                    record,
                    field,
                    type_name,
                })
            }
        }
    }

    /// Resolves every nested field of every registered record.
    ///
    /// Run once at startup so a broken descriptor table fails before the first
    /// payload arrives instead of on whichever update first carries the field.
    pub fn validate_schema() -> MarshalResult<()> {
        Self::validate_kinds(RecordKind::ALL)
    }

    pub(crate) fn validate_kinds(kinds: &[RecordKind]) -> MarshalResult<()> {
        let mut resolved = 0usize;
        for kind in kinds {
            for descriptor in kind.descriptors() {
                if let Some(target) = descriptor.kind.target() {
                    Self::resolve(kind.name(), descriptor.name, target)?;
                    resolved += 1;
                }
            }
        }
        debug!(
            records = kinds.len(),
            nested_fields = resolved,
            "Record schema resolved"
        );
        Ok(())
    }
}
