//! Fuzz testing for the builder.
//!
//! Drives `Builder` with arbitrary operation sequences, including invalid
//! ones, and checks that every finished buffer reads back without errors and
//! that rejected calls never panic.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use flexbuf::{get_root, BuilderFlags, BuilderOptions, FrameHandle, Reference};

#[derive(Debug, Arbitrary)]
struct BuilderInput {
    flags: u8,
    fixed_capacity: Option<u16>,
    operations: Vec<BuilderOperation>,
}

#[derive(Debug, Arbitrary)]
enum BuilderOperation {
    Null(Option<String>),
    Bool(Option<String>, bool),
    Int(Option<String>, i64),
    UInt(Option<String>, u64),
    Float(Option<String>, f32),
    Double(Option<String>, f64),
    Str(Option<String>, String),
    Blob(Option<String>, Vec<u8>),
    IndirectInt(Option<String>, i64),
    IndirectDouble(Option<String>, f64),
    StartVector,
    StartMap,
    EndVector(Option<String>, bool, bool),
    EndMap(Option<String>),
    Clear,
}

fn walk(reference: Reference<'_>, depth: usize) {
    if depth > 64 {
        return;
    }
    let _ = reference.as_i64();
    let _ = reference.as_f64();
    let _ = reference.as_str();
    let _ = reference.to_string();
    for element in reference.as_vector().iter() {
        let element = element.expect("builder output must be readable");
        walk(element, depth + 1);
    }
    let map = reference.as_map();
    for key in map.keys().iter() {
        let key = key.expect("builder output must be readable");
        let position = map.position(key.as_bytes()).expect("lookup of present key");
        assert!(position.is_some());
    }
}

fuzz_target!(|input: BuilderInput| {
    if input.operations.len() > 500 {
        return;
    }

    let flags = match input.flags % 4 {
        0 => BuilderFlags::NONE,
        1 => BuilderFlags::SHARE_KEYS,
        2 => BuilderFlags::SHARE_STRINGS,
        _ => BuilderFlags::SHARE_KEYS_AND_STRINGS,
    };
    let options = BuilderOptions::new().flags(flags);
    let options = match input.fixed_capacity {
        Some(capacity) => options.fixed_capacity(capacity as usize),
        None => options,
    };
    let mut builder = options.build();
    let mut handles: Vec<(FrameHandle, bool)> = Vec::new();

    for op in &input.operations {
        let _ = match op {
            BuilderOperation::Null(k) => builder.put_null(k.as_deref()),
            BuilderOperation::Bool(k, v) => builder.put_bool(k.as_deref(), *v),
            BuilderOperation::Int(k, v) => builder.put_int(k.as_deref(), *v),
            BuilderOperation::UInt(k, v) => builder.put_uint(k.as_deref(), *v),
            BuilderOperation::Float(k, v) => builder.put_float(k.as_deref(), *v),
            BuilderOperation::Double(k, v) => builder.put_double(k.as_deref(), *v),
            BuilderOperation::Str(k, v) => builder.put_string(k.as_deref(), v),
            BuilderOperation::Blob(k, v) => builder.put_blob(k.as_deref(), v),
            BuilderOperation::IndirectInt(k, v) => builder.put_indirect_int(k.as_deref(), *v),
            BuilderOperation::IndirectDouble(k, v) => {
                builder.put_indirect_double(k.as_deref(), *v)
            }
            BuilderOperation::StartVector => builder.start_vector().map(|h| handles.push((h, false))),
            BuilderOperation::StartMap => builder.start_map().map(|h| handles.push((h, true))),
            BuilderOperation::EndVector(k, typed, fixed) => match handles.last().copied() {
                Some((handle, false)) => builder
                    .end_vector(k.as_deref(), handle, *typed, *fixed)
                    .map(|_| {
                        handles.pop();
                    }),
                _ => Ok(()),
            },
            BuilderOperation::EndMap(k) => match handles.last().copied() {
                Some((handle, true)) => builder.end_map(k.as_deref(), handle).map(|_| {
                    handles.pop();
                }),
                _ => Ok(()),
            },
            BuilderOperation::Clear => {
                builder.clear();
                handles.clear();
                Ok(())
            }
        };
    }

    if let Ok(bytes) = builder.finish() {
        let root = get_root(bytes).expect("finished buffer must have a readable root");
        walk(root, 0);
    }
});
