//! Resolution turns a writer/reader pair of schema graphs
//! into a new graph prepared for repeated decoding.
//!
//! Only the outermost pair and the fields of records get genuine
//! writer/reader differentiation. Union alternatives, array items,
//! map values and recursive targets always resolve against themselves,
//! so schema evolution stops at those edges.
//!
//! Cycles are cut at [`RecursiveSchema`] nodes. Every record, union, array
//! and map node is registered in a job-scoped table keyed by node identity,
//! so a node reachable through several paths is resolved once and
//! re-entering a node that is still being resolved terminates.

mod record;

use std::sync::{Arc, Weak};

use hashbrown::HashMap;

use crate::{
    error::Result,
    schema::{ArraySchema, MapSchema, RecursiveSchema, Schema, SchemaRef, UnionSchema},
};

/// Prepares a schema for decoding data written with the very same schema.
///
/// Equivalent to `prepare_resolving(schema, schema)`.
pub fn prepare(schema: &SchemaRef) -> Result<SchemaRef> {
    prepare_resolving(schema, schema)
}

/// Prepares a schema for decoding data written with `writer` schema
/// into the shape described by `reader` schema.
///
/// Support is limited to adding and removing fields of records.
/// Field set differences are not reported here, they surface
/// when a decode plan is compiled for a destination type.
pub fn prepare_resolving(writer: &SchemaRef, reader: &SchemaRef) -> Result<SchemaRef> {
    let mut job = PrepareJob::new();
    let output = job.prepare(writer, reader)?;

    tracing::debug!(
        schema = %output,
        memoized = job.seen.len(),
        "prepared schema"
    );

    Ok(output)
}

/// State of one top-level resolution.
struct PrepareJob {
    /// Outputs by address of the input node.
    /// Weak because outputs are registered before their children exist.
    seen: HashMap<*const Schema, Weak<Schema>, ahash::RandomState>,
}

impl PrepareJob {
    fn new() -> Self {
        PrepareJob {
            seen: HashMap::default(),
        }
    }

    fn prepare(&mut self, writer: &SchemaRef, reader: &SchemaRef) -> Result<SchemaRef> {
        if let Some(output) = self.seen(Arc::as_ptr(writer)) {
            return Ok(output);
        }

        match **writer {
            Schema::Record(ref record) => self.prepare_record(writer, record, reader),
            Schema::Resolved(ref resolved) => {
                self.prepare_record(writer, resolved.writer(), reader)
            }
            Schema::Recursive(ref recursive) => self.prepare_recursive(recursive),
            Schema::Union(ref union) => {
                self.build_cyclic(writer, |job| job.prepare_union(union).map(Schema::Union))
            }
            Schema::Array(ref array) => {
                self.build_cyclic(writer, |job| job.prepare_array(array).map(Schema::Array))
            }
            Schema::Map(ref map) => {
                self.build_cyclic(writer, |job| job.prepare_map(map).map(Schema::Map))
            }
            _ => Ok(writer.clone()),
        }
    }

    /// Builds output for `node`.
    ///
    /// The output is registered before `build` descends into children,
    /// so recursive edges reaching `node` meanwhile find it in progress.
    fn build_cyclic(
        &mut self,
        node: &SchemaRef,
        build: impl FnOnce(&mut Self) -> Result<Schema>,
    ) -> Result<SchemaRef> {
        let mut failure = None;

        let output = Arc::new_cyclic(|this| {
            self.seen.insert(Arc::as_ptr(node), this.clone());

            build(self).unwrap_or_else(|err| {
                failure = Some(err);
                Schema::Null
            })
        });

        match failure {
            None => Ok(output),
            Some(err) => Err(err),
        }
    }

    /// Returns finished output for the input node at `key`.
    #[inline(always)]
    fn seen(&self, key: *const Schema) -> Option<SchemaRef> {
        self.seen.get(&key).and_then(Weak::upgrade)
    }

    /// A finished target is returned as is.
    /// A target that is still being resolved is an ancestor of this edge,
    /// it is referenced weakly through a new recursive node.
    /// An unseen target is resolved against itself.
    fn prepare_recursive(&mut self, recursive: &RecursiveSchema) -> Result<SchemaRef> {
        match self.seen.get(&recursive.target()) {
            Some(target) => match target.upgrade() {
                Some(finished) => Ok(finished),
                None => Ok(Arc::new(Schema::Recursive(RecursiveSchema::new(
                    recursive.name(),
                    target.clone(),
                )))),
            },
            None => {
                let actual = recursive.actual()?;
                self.prepare(&actual, &actual)
            }
        }
    }

    fn prepare_union(&mut self, input: &UnionSchema) -> Result<UnionSchema> {
        let types = input
            .types
            .iter()
            .map(|ty| self.prepare(ty, ty))
            .collect::<Result<Vec<_>>>()?;

        Ok(UnionSchema { types })
    }

    fn prepare_array(&mut self, input: &ArraySchema) -> Result<ArraySchema> {
        Ok(ArraySchema {
            properties: input.properties.clone(),
            items: self.prepare(&input.items, &input.items)?,
        })
    }

    fn prepare_map(&mut self, input: &MapSchema) -> Result<MapSchema> {
        Ok(MapSchema {
            properties: input.properties.clone(),
            values: self.prepare(&input.values, &input.values)?,
        })
    }
}
