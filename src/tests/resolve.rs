use std::{
    collections::BTreeMap,
    sync::{Arc, Weak},
};

use crate::{
    prepare, prepare_resolving, ArraySchema, Error, MapSchema, RecordSchema, Schema, SchemaKind,
    SchemaRef,
};

use super::{describe, init_tracing, linked_list, long_record, nested_lists, tree};

fn field_names(schema: &Schema) -> Vec<&str> {
    schema
        .as_record()
        .unwrap()
        .fields
        .iter()
        .map(|field| field.name.as_str())
        .collect()
}

fn field_type<'a>(schema: &'a Schema, name: &str) -> &'a SchemaRef {
    &schema.as_record().unwrap().get(name).unwrap().ty
}

#[test]
fn test_cycle_termination() {
    init_tracing();

    let list = linked_list();
    let resolved = prepare(&list).unwrap();
    assert!(resolved.as_resolved().is_some());

    let Schema::Union(next) = &**field_type(&resolved, "next") else {
        panic!("expected union");
    };
    assert_eq!(next.types.len(), 2);

    let Schema::Recursive(edge) = &*next.types[1] else {
        panic!("expected recursive edge");
    };
    assert!(edge.points_to(&resolved));
    assert!(Schema::ptr_eq(&edge.actual().unwrap(), &resolved));
}

#[test]
fn test_resolved_graph_is_freed() {
    let list = linked_list();
    let resolved = prepare(&list).unwrap();
    let weak = Arc::downgrade(&resolved);

    drop(resolved);
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_field_order() {
    let writer = long_record("R", &["a", "b", "c"]);
    let reader = long_record("R", &["c", "b", "a"]);

    let resolved = prepare_resolving(&writer, &reader).unwrap();
    assert_eq!(field_names(&resolved), ["a", "b", "c"]);
}

#[test]
fn test_reader_only_fields_not_added() {
    let writer = long_record("R", &["a"]);
    let reader = long_record("R", &["a", "z"]);

    let resolved = prepare_resolving(&writer, &reader).unwrap();
    assert_eq!(field_names(&resolved), ["a"]);

    let record = resolved.as_resolved().unwrap();
    assert!(Schema::ptr_eq(record.reader(), &reader));
}

#[test]
fn test_field_metadata_carried() {
    let writer = RecordSchema::new("R")
        .with_doc("a record")
        .field_with_default("a", Schema::long(), crate::Value::Long(7))
        .into_schema();

    let resolved = prepare(&writer).unwrap();
    let record = resolved.as_record().unwrap();
    assert_eq!(record.doc.as_deref(), Some("a record"));
    assert_eq!(record.fields[0].default, Some(crate::Value::Long(7)));
}

#[test]
fn test_union_passthrough() {
    let types = [Schema::null(), Schema::int(), Schema::string()];
    let union = Schema::union(types.iter().cloned());

    let resolved = prepare(&union).unwrap();
    assert!(!Schema::ptr_eq(&resolved, &union));

    let Schema::Union(resolved_union) = &*resolved else {
        panic!("expected union");
    };
    assert_eq!(resolved_union.types.len(), types.len());
    for (resolved, input) in resolved_union.types.iter().zip(&types) {
        assert!(Schema::ptr_eq(resolved, input));
    }
}

#[test]
fn test_primitive_unchanged() {
    let long = Schema::long();
    assert!(Schema::ptr_eq(&prepare(&long).unwrap(), &long));

    let fixed = Schema::fixed("md5", 16);
    assert!(Schema::ptr_eq(&prepare(&fixed).unwrap(), &fixed));
}

#[test]
fn test_array_of_recursive_record() {
    let tree = tree();
    let forest = Schema::array(tree.clone());

    let resolved = prepare(&forest).unwrap();
    let Schema::Array(forest) = &*resolved else {
        panic!("expected array");
    };
    assert_eq!(forest.items.kind(), SchemaKind::Record);

    let Schema::Array(children) = &**field_type(&forest.items, "children") else {
        panic!("expected array");
    };
    let Schema::Recursive(edge) = &*children.items else {
        panic!("expected recursive edge");
    };
    assert!(edge.points_to(&forest.items));
}

#[test]
fn test_map_values() {
    let point = long_record("Point", &["x", "y"]);

    let mut properties = BTreeMap::new();
    properties.insert("logicalType".to_owned(), "registry".to_owned());
    let map: SchemaRef = Arc::new(Schema::Map(MapSchema {
        properties: properties.clone(),
        values: point,
    }));

    let resolved = prepare(&map).unwrap();
    let Schema::Map(resolved_map) = &*resolved else {
        panic!("expected map");
    };
    assert_eq!(resolved_map.properties, properties);
    assert!(resolved_map.values.as_resolved().is_some());
    assert_eq!(field_names(&resolved_map.values), ["x", "y"]);
}

#[test]
fn test_shared_substructure_resolved_once() {
    let point = long_record("Point", &["x", "y"]);
    let line = RecordSchema::new("Line")
        .field("from", point.clone())
        .field("to", point.clone())
        .into_schema();

    let resolved = prepare(&line).unwrap();
    let from = field_type(&resolved, "from");
    let to = field_type(&resolved, "to");
    assert!(Schema::ptr_eq(from, to));
    assert!(!Schema::ptr_eq(from, &point));
}

#[test]
fn test_schema_mismatch() {
    let writer = long_record("R", &["a"]);
    let reader = Schema::long();

    let err = prepare_resolving(&writer, &reader).unwrap_err();
    assert_eq!(
        err,
        Error::SchemaMismatch {
            writer: SchemaKind::Record,
            reader: SchemaKind::Long,
        }
    );
}

#[test]
fn test_idempotence() {
    let list = linked_list();
    let once = prepare(&list).unwrap();
    let twice = prepare(&once).unwrap();

    assert!(!Schema::ptr_eq(&once, &twice));
    assert_eq!(describe(&list), describe(&once));
    assert_eq!(describe(&once), describe(&twice));

    let Schema::Union(next) = &**field_type(&twice, "next") else {
        panic!("expected union");
    };
    let Schema::Recursive(edge) = &*next.types[1] else {
        panic!("expected recursive edge");
    };
    assert!(edge.points_to(&twice));
}

#[test]
fn test_nested_records_resolve_against_themselves() {
    let writer_inner = long_record("Inner", &["a", "b"]);
    let reader_inner = long_record("Inner", &["a"]);

    let writer = RecordSchema::new("Outer")
        .field("inner", writer_inner.clone())
        .into_schema();
    let reader = RecordSchema::new("Outer")
        .field("inner", reader_inner)
        .into_schema();

    let resolved = prepare_resolving(&writer, &reader).unwrap();
    let inner = field_type(&resolved, "inner").as_resolved().unwrap();

    assert!(Schema::ptr_eq(inner.reader(), &writer_inner));
    assert_eq!(inner.fields().len(), 2);
}

#[test]
fn test_dangling_reference() {
    let writer = RecordSchema::new("Holder")
        .field("gone", Schema::recursive("Gone", &Weak::new()))
        .into_schema();

    let err = prepare(&writer).unwrap_err();
    assert_eq!(
        err,
        Error::DanglingReference {
            name: "Gone".to_owned()
        }
    );
}

#[test]
fn test_reference_to_unrelated_record() {
    let target = long_record("Target", &["x"]);
    let holder = RecordSchema::new("Holder")
        .field("first", Schema::recursive("Target", &Arc::downgrade(&target)))
        .field("second", target.clone())
        .into_schema();

    let resolved = prepare(&holder).unwrap();
    let first = field_type(&resolved, "first");
    let second = field_type(&resolved, "second");

    assert!(first.as_resolved().is_some());
    assert!(Schema::ptr_eq(first, second));
}

#[test]
fn test_jobs_do_not_share_results() {
    let record = long_record("R", &["a"]);
    let first = prepare(&record).unwrap();
    let second = prepare(&record).unwrap();
    assert!(!Schema::ptr_eq(&first, &second));
}

#[test]
fn test_array_refers_to_itself() {
    let lists = nested_lists();
    let resolved = prepare(&lists).unwrap();

    let Schema::Array(array) = &*resolved else {
        panic!("expected array");
    };
    let Schema::Union(items) = &*array.items else {
        panic!("expected union");
    };
    let Schema::Recursive(edge) = &*items.types[1] else {
        panic!("expected recursive edge");
    };
    assert!(edge.points_to(&resolved));

    let weak = Arc::downgrade(&resolved);
    drop(resolved);
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_map_refers_to_itself() {
    let map: SchemaRef = Arc::new_cyclic(|this| {
        Schema::Map(MapSchema {
            properties: BTreeMap::new(),
            values: Schema::recursive("Dir", this),
        })
    });

    let resolved = prepare(&map).unwrap();
    let Schema::Map(resolved_map) = &*resolved else {
        panic!("expected map");
    };
    let Schema::Recursive(edge) = &*resolved_map.values else {
        panic!("expected recursive edge");
    };
    assert!(edge.points_to(&resolved));
    assert!(Schema::ptr_eq(&edge.actual().unwrap(), &resolved));
}

#[test]
fn test_union_refers_to_itself_through_array() {
    let union: SchemaRef = Arc::new_cyclic(|this| {
        Schema::Union(crate::UnionSchema {
            types: vec![
                Schema::long(),
                Arc::new(Schema::Array(ArraySchema {
                    properties: BTreeMap::new(),
                    items: Schema::recursive("Json", this),
                })),
            ],
        })
    });

    let resolved = prepare(&union).unwrap();
    let Schema::Union(resolved_union) = &*resolved else {
        panic!("expected union");
    };
    let Schema::Array(array) = &*resolved_union.types[1] else {
        panic!("expected array");
    };
    let Schema::Recursive(edge) = &*array.items else {
        panic!("expected recursive edge");
    };
    assert!(edge.points_to(&resolved));
}
