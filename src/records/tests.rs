//! Tests for the records module

use super::*;
use crate::config::{BuilderFlags, BuilderOptions};
use crate::encoding::FlexType;
use crate::error::FlexError;

fn kind(err: &eyre::Report) -> Option<&FlexError> {
    err.downcast_ref::<FlexError>()
}

fn is_structural(err: &eyre::Report) -> bool {
    matches!(kind(err), Some(FlexError::Structural(_)))
}

fn single_int(value: i64) -> Vec<u8> {
    let mut builder = Builder::new();
    builder.put_int(None, value).unwrap();
    builder.finish().unwrap().to_vec()
}

#[test]
fn root_int_encodes_as_three_bytes() {
    assert_eq!(single_int(1), vec![0x01, 0x04, 0x01]);
}

#[test]
fn root_bool_encodes_with_bool_type() {
    let mut builder = Builder::new();
    builder.put_bool(None, true).unwrap();
    assert_eq!(builder.finish().unwrap(), &[0x01, 0x68, 0x01]);
}

#[test]
fn root_string_layout() {
    let mut builder = Builder::new();
    builder.put_string(None, "abc").unwrap();
    assert_eq!(
        builder.finish().unwrap(),
        &[0x03, b'a', b'b', b'c', 0x00, 0x04, 0x14, 0x01]
    );
}

#[test]
fn untyped_and_typed_vector_layouts() {
    let mut builder = Builder::new();
    let vec = builder.start_vector().unwrap();
    for v in 1..=3 {
        builder.put_int(None, v).unwrap();
    }
    builder.end_vector(None, vec, false, false).unwrap();
    assert_eq!(
        builder.finish().unwrap(),
        &[0x03, 1, 2, 3, 0x04, 0x04, 0x04, 0x06, 0x28, 0x01]
    );

    builder.clear();
    let vec = builder.start_vector().unwrap();
    for v in 1..=3 {
        builder.put_int(None, v).unwrap();
    }
    builder.end_vector(None, vec, true, false).unwrap();
    assert_eq!(builder.finish().unwrap(), &[0x03, 1, 2, 3, 0x03, 0x2c, 0x01]);
}

#[test]
fn single_entry_map_layout() {
    let mut builder = Builder::new();
    let map = builder.start_map().unwrap();
    builder.put_int(Some("a"), 1).unwrap();
    builder.end_map(None, map).unwrap();
    assert_eq!(
        builder.finish().unwrap(),
        &[b'a', 0x00, 0x01, 0x03, 0x01, 0x01, 0x01, 0x01, 0x04, 0x02, 0x24, 0x01]
    );
}

#[test]
fn signed_integers_roundtrip_at_width_boundaries() {
    let values = [
        0,
        1,
        -1,
        i8::MIN as i64,
        i8::MAX as i64,
        i8::MAX as i64 + 1,
        i16::MIN as i64,
        i16::MAX as i64,
        i16::MAX as i64 + 1,
        i32::MIN as i64,
        i32::MAX as i64,
        i32::MAX as i64 + 1,
        i64::MIN,
        i64::MAX,
    ];
    for value in values {
        let bytes = single_int(value);
        let root = get_root(&bytes).unwrap();
        assert!(root.is_int());
        assert_eq!(root.as_i64(), value, "value {}", value);
    }
}

#[test]
fn unsigned_integers_roundtrip_at_width_boundaries() {
    let values = [
        0,
        u8::MAX as u64,
        u8::MAX as u64 + 1,
        u16::MAX as u64,
        u16::MAX as u64 + 1,
        u32::MAX as u64,
        u32::MAX as u64 + 1,
        u64::MAX,
    ];
    for value in values {
        let mut builder = Builder::new();
        builder.put_uint(None, value).unwrap();
        let bytes = builder.finish().unwrap().to_vec();
        let root = get_root(&bytes).unwrap();
        assert!(root.is_uint());
        assert_eq!(root.as_u64(), value);
    }
}

#[test]
fn floats_roundtrip_bit_exact() {
    let doubles = [
        0.0,
        -0.0,
        1.5,
        f64::MIN,
        f64::MAX,
        f64::MIN_POSITIVE,
        f64::from_bits(1),
        f64::INFINITY,
    ];
    for value in doubles {
        let mut builder = Builder::new();
        builder.put_double(None, value).unwrap();
        let bytes = builder.finish().unwrap().to_vec();
        let root = get_root(&bytes).unwrap();
        assert!(root.is_float());
        assert_eq!(root.as_f64().to_bits(), value.to_bits());
    }

    let singles = [3.14f32, f32::MAX, f32::MIN_POSITIVE, f32::from_bits(1)];
    for value in singles {
        let mut builder = Builder::new();
        builder.put_float(None, value).unwrap();
        let bytes = builder.finish().unwrap().to_vec();
        assert_eq!(bytes.len(), 6);
        let root = get_root(&bytes).unwrap();
        assert_eq!(root.as_f32().to_bits(), value.to_bits());
    }
}

#[test]
fn nan_survives_as_nan() {
    let mut builder = Builder::new();
    builder.put_double(None, f64::NAN).unwrap();
    let bytes = builder.finish().unwrap().to_vec();
    assert!(get_root(&bytes).unwrap().as_f64().is_nan());
}

#[test]
fn mixed_vector_widens_every_slot() {
    let values = [1i64, 300, -70_000, i64::MIN];
    let mut builder = Builder::new();
    let vec = builder.start_vector().unwrap();
    for v in values {
        builder.put_int(None, v).unwrap();
    }
    builder.end_vector(None, vec, false, false).unwrap();
    let bytes = builder.finish().unwrap().to_vec();

    let vector = get_root(&bytes).unwrap().as_vector();
    assert_eq!(vector.byte_width(), 8);
    let read: Vec<i64> = vector.iter().map(|r| r.unwrap().as_i64()).collect();
    assert_eq!(read, values);
}

#[test]
fn heterogeneous_vector_preserves_order_and_types() {
    let mut builder = Builder::new();
    let vec = builder.start_vector().unwrap();
    builder.put_null(None).unwrap();
    builder.put_bool(None, true).unwrap();
    builder.put_int(None, -5).unwrap();
    builder.put_uint(None, 70_000).unwrap();
    builder.put_double(None, 2.5).unwrap();
    builder.put_string(None, "text").unwrap();
    builder.put_blob(None, &[1, 2, 3]).unwrap();
    builder.end_vector(None, vec, false, false).unwrap();
    let bytes = builder.finish().unwrap().to_vec();

    let vector = get_root(&bytes).unwrap().as_vector();
    assert_eq!(vector.len(), 7);
    assert!(vector.get(0).unwrap().is_null());
    assert!(vector.get(1).unwrap().as_bool());
    assert_eq!(vector.get(2).unwrap().as_i64(), -5);
    assert_eq!(vector.get(3).unwrap().as_u64(), 70_000);
    assert_eq!(vector.get(4).unwrap().as_f64(), 2.5);
    assert_eq!(vector.get(5).unwrap().as_str(), "text");
    assert_eq!(vector.get(6).unwrap().as_blob().as_bytes(), &[1, 2, 3]);
    assert!(vector.get(7).unwrap().is_null());
}

#[test]
fn typed_vectors_of_each_element_type() {
    let mut builder = Builder::new();
    let outer = builder.start_vector().unwrap();

    let ints = builder.start_vector().unwrap();
    builder.put_int(None, -1).unwrap();
    builder.put_int(None, 1000).unwrap();
    builder.end_vector(None, ints, true, false).unwrap();

    let uints = builder.start_vector().unwrap();
    builder.put_uint(None, 7).unwrap();
    builder.end_vector(None, uints, true, false).unwrap();

    let floats = builder.start_vector().unwrap();
    builder.put_double(None, 0.25).unwrap();
    builder.put_double(None, -8.0).unwrap();
    builder.end_vector(None, floats, true, false).unwrap();

    let bools = builder.start_vector().unwrap();
    builder.put_bool(None, true).unwrap();
    builder.put_bool(None, false).unwrap();
    builder.end_vector(None, bools, true, false).unwrap();

    builder.end_vector(None, outer, false, false).unwrap();
    let bytes = builder.finish().unwrap().to_vec();
    let outer = get_root(&bytes).unwrap().as_vector();

    let ints = outer.get(0).unwrap();
    assert_eq!(ints.flex_type(), FlexType::VectorInt);
    assert_eq!(ints.as_vector().element_type(), Some(FlexType::Int));
    assert_eq!(ints.as_vector().get(0).unwrap().as_i64(), -1);
    assert_eq!(ints.as_vector().get(1).unwrap().as_i64(), 1000);

    let uints = outer.get(1).unwrap();
    assert_eq!(uints.flex_type(), FlexType::VectorUInt);
    assert_eq!(uints.as_vector().get(0).unwrap().as_u64(), 7);

    let floats = outer.get(2).unwrap().as_vector();
    assert_eq!(floats.byte_width(), 8);
    assert_eq!(floats.get(0).unwrap().as_f64(), 0.25);
    assert_eq!(floats.get(1).unwrap().as_f64(), -8.0);

    let bools = outer.get(3).unwrap();
    assert_eq!(bools.flex_type(), FlexType::VectorBool);
    assert!(bools.as_vector().get(0).unwrap().as_bool());
    assert!(!bools.as_vector().get(1).unwrap().as_bool());
}

#[test]
fn fixed_typed_vector_has_no_length_prefix() {
    let mut builder = Builder::new();
    let vec = builder.start_vector().unwrap();
    for v in [10u64, 20, 30] {
        builder.put_uint(None, v).unwrap();
    }
    builder.end_vector(None, vec, true, true).unwrap();
    let bytes = builder.finish().unwrap().to_vec();
    assert_eq!(bytes, vec![10, 20, 30, 0x03, 0x50, 0x01]);

    let root = get_root(&bytes).unwrap();
    assert_eq!(root.flex_type(), FlexType::VectorUInt3);
    assert!(root.is_fixed_typed_vector());
    let vector = root.as_vector();
    assert_eq!(vector.len(), 3);
    assert_eq!(vector.get(2).unwrap().as_u64(), 30);
}

#[test]
fn fixed_typed_vector_rejects_bad_lengths_and_allows_retry() {
    let mut builder = Builder::new();
    let vec = builder.start_vector().unwrap();
    for v in 0..5 {
        builder.put_int(None, v).unwrap();
    }
    let before = builder.len();
    let err = builder.end_vector(None, vec, true, true).unwrap_err();
    assert!(is_structural(&err));
    assert_eq!(builder.len(), before);

    builder.end_vector(None, vec, true, false).unwrap();
    let bytes = builder.finish().unwrap().to_vec();
    assert_eq!(get_root(&bytes).unwrap().as_vector().len(), 5);
}

#[test]
fn typed_request_with_mixed_elements_writes_untyped_vector() {
    let mut builder = Builder::new();
    let vec = builder.start_vector().unwrap();
    builder.put_int(None, 1).unwrap();
    builder.put_double(None, 2.5).unwrap();
    builder.end_vector(None, vec, true, false).unwrap();
    let bytes = builder.finish().unwrap().to_vec();

    let root = get_root(&bytes).unwrap();
    assert!(root.is_vector());
    assert!(!root.is_typed_vector());
    let vector = root.as_vector();
    assert_eq!(vector.len(), 2);
    assert!(vector.get(0).unwrap().is_int());
    assert_eq!(vector.get(0).unwrap().as_i64(), 1);
    assert!(vector.get(1).unwrap().is_float());
    assert_eq!(vector.get(1).unwrap().as_f64(), 2.5);
}

#[test]
fn typed_request_starting_with_string_is_not_deprecated_when_mixed() {
    let mut builder = Builder::new();
    let vec = builder.start_vector().unwrap();
    builder.put_string(None, "a").unwrap();
    builder.put_int(None, 1).unwrap();
    builder.end_vector(None, vec, true, false).unwrap();
    let bytes = builder.finish().unwrap().to_vec();

    let root = get_root(&bytes).unwrap();
    assert_eq!(root.flex_type(), FlexType::Vector);
    assert_eq!(root.as_vector().get(0).unwrap().as_str(), "a");
    assert_eq!(root.as_vector().get(1).unwrap().as_i64(), 1);
}

#[test]
fn typed_request_over_untypeable_elements_writes_untyped_vector() {
    let mut builder = Builder::new();
    let outer = builder.start_vector().unwrap();
    let nulls = builder.start_vector().unwrap();
    builder.put_null(None).unwrap();
    builder.put_null(None).unwrap();
    builder.end_vector(None, nulls, true, false).unwrap();
    let blobs = builder.start_vector().unwrap();
    builder.put_blob(None, &[7, 8]).unwrap();
    builder.put_blob(None, &[9]).unwrap();
    builder.end_vector(None, blobs, true, true).unwrap();
    builder.end_vector(None, outer, false, false).unwrap();
    let bytes = builder.finish().unwrap().to_vec();

    let outer = get_root(&bytes).unwrap().as_vector();
    let nulls = outer.get(0).unwrap();
    assert_eq!(nulls.flex_type(), FlexType::Vector);
    assert_eq!(nulls.as_vector().len(), 2);
    assert!(nulls.as_vector().get(1).unwrap().is_null());
    let blobs = outer.get(1).unwrap();
    assert_eq!(blobs.flex_type(), FlexType::Vector);
    assert_eq!(blobs.as_vector().len(), 2);
    assert_eq!(blobs.as_vector().get(0).unwrap().as_blob().as_bytes(), &[7, 8]);
    assert_eq!(blobs.as_vector().get(1).unwrap().as_blob().as_bytes(), &[9]);
}

#[test]
fn typed_vector_of_strings_is_deprecated_but_retryable() {
    let mut builder = Builder::new();
    let vec = builder.start_vector().unwrap();
    builder.put_string(None, "foo").unwrap();
    builder.put_string(None, "bar").unwrap();
    let err = builder.end_vector(None, vec, true, false).unwrap_err();
    assert!(matches!(kind(&err), Some(FlexError::Deprecated(_))));

    builder.end_vector(None, vec, false, false).unwrap();
    let bytes = builder.finish().unwrap().to_vec();
    let vector = get_root(&bytes).unwrap().as_vector();
    assert_eq!(vector.get(0).unwrap().as_str(), "foo");
    assert_eq!(vector.get(1).unwrap().as_str(), "bar");
}

#[test]
fn empty_typed_vector_is_a_key_vector() {
    let mut builder = Builder::new();
    let vec = builder.start_vector().unwrap();
    builder.end_vector(None, vec, true, false).unwrap();
    let bytes = builder.finish().unwrap().to_vec();
    let root = get_root(&bytes).unwrap();
    assert_eq!(root.flex_type(), FlexType::VectorKey);
    assert!(root.as_vector().is_empty());
}

#[test]
fn indirect_scalars_keep_the_vector_narrow() {
    let mut builder = Builder::new();
    let vec = builder.start_vector().unwrap();
    builder.put_indirect_int(None, i64::MAX).unwrap();
    builder.put_indirect_uint(None, u64::MAX).unwrap();
    builder.put_indirect_double(None, 0.1).unwrap();
    builder.put_indirect_float(None, 1.5).unwrap();
    builder.put_int(None, 1).unwrap();
    builder.end_vector(None, vec, false, false).unwrap();
    let bytes = builder.finish().unwrap().to_vec();

    let vector = get_root(&bytes).unwrap().as_vector();
    assert_eq!(vector.byte_width(), 1);
    let first = vector.get(0).unwrap();
    assert_eq!(first.flex_type(), FlexType::IndirectInt);
    assert!(first.is_int());
    assert_eq!(first.as_i64(), i64::MAX);
    assert_eq!(vector.get(1).unwrap().as_u64(), u64::MAX);
    assert_eq!(vector.get(2).unwrap().as_f64(), 0.1);
    assert_eq!(vector.get(3).unwrap().as_f32(), 1.5);
    assert_eq!(vector.get(4).unwrap().as_i64(), 1);
}

#[test]
fn map_keys_are_sorted_and_lookup_matches_linear_scan() {
    let names = ["zeta", "alpha", "mid", "Beta", "al", "\u{e9}t\u{e9}", "x"];
    let mut builder = Builder::new();
    let map = builder.start_map().unwrap();
    for (i, name) in names.iter().enumerate() {
        builder.put_int(Some(*name), i as i64).unwrap();
    }
    builder.end_map(None, map).unwrap();
    let bytes = builder.finish().unwrap().to_vec();

    let map = get_root(&bytes).unwrap().as_map();
    assert_eq!(map.size(), names.len());
    let keys: Vec<&[u8]> = map.keys().iter().map(|k| k.unwrap().as_bytes()).collect();
    assert!(keys.windows(2).all(|w| w[0] <= w[1]));

    for (i, name) in names.iter().enumerate() {
        let linear = (0..map.len())
            .find(|&j| map.keys().get(j).unwrap().as_bytes() == name.as_bytes())
            .unwrap();
        assert_eq!(map.get(name).unwrap().as_i64(), i as i64);
        assert_eq!(map.get_index(linear).unwrap().as_i64(), i as i64);
    }
    assert!(map.get("missing").unwrap().is_null());
    assert!(map.get("").unwrap().is_null());
    assert!(map.get("zz").unwrap().is_null());
}

#[test]
fn large_map_lookup_uses_wide_key_offsets() {
    let mut builder = Builder::new();
    let map = builder.start_map().unwrap();
    for i in (0..300).rev() {
        let key = format!("key{:04}", i);
        builder.put_int(Some(key.as_str()), i).unwrap();
    }
    builder.end_map(None, map).unwrap();
    let bytes = builder.finish().unwrap().to_vec();

    let map = get_root(&bytes).unwrap().as_map();
    assert_eq!(map.len(), 300);
    assert!(map.keys().len() == 300);
    for i in [0, 1, 150, 255, 256, 299] {
        assert_eq!(map.get(&format!("key{:04}", i)).unwrap().as_i64(), i);
    }
    assert_eq!(map.keys().get(0).unwrap().as_str(), "key0000");
    assert!(map.get("key0300").unwrap().is_null());
}

#[test]
fn duplicate_keys_resolve_to_first_inserted() {
    let mut builder = Builder::new();
    let map = builder.start_map().unwrap();
    builder.put_int(Some("b"), 0).unwrap();
    builder.put_int(Some("k"), 1).unwrap();
    builder.put_int(Some("a"), 0).unwrap();
    builder.put_int(Some("k"), 2).unwrap();
    builder.end_map(None, map).unwrap();
    let bytes = builder.finish().unwrap().to_vec();

    let map = get_root(&bytes).unwrap().as_map();
    assert_eq!(map.len(), 4);
    assert_eq!(map.get("k").unwrap().as_i64(), 1);
    assert_eq!(map.position(b"k").unwrap(), Some(2));
}

#[test]
fn nested_containers_roundtrip() {
    let mut builder = Builder::new();
    let root = builder.start_map().unwrap();
    let inner = builder.start_map().unwrap();
    builder.put_string(Some("name"), "inner").unwrap();
    let list = builder.start_vector().unwrap();
    builder.put_int(None, 1).unwrap();
    builder.put_int(None, 2).unwrap();
    builder.end_vector(Some("list"), list, false, false).unwrap();
    builder.end_map(Some("child"), inner).unwrap();
    builder.put_bool(Some("flag"), false).unwrap();
    builder.end_map(None, root).unwrap();
    let bytes = builder.finish().unwrap().to_vec();

    let root = get_root(&bytes).unwrap().as_map();
    let child = root.get("child").unwrap();
    assert!(child.is_map());
    let child = child.as_map();
    assert_eq!(child.get("name").unwrap().as_str(), "inner");
    assert_eq!(child.get("list").unwrap().as_vector().get(1).unwrap().as_i64(), 2);
    assert!(!root.get("flag").unwrap().as_bool());
}

#[test]
fn strings_past_one_byte_offsets_roundtrip() {
    let mut builder = Builder::new();
    let vec = builder.start_vector().unwrap();
    for i in 0..100 {
        builder.put_string(None, &format!("value-{}", i)).unwrap();
    }
    builder.end_vector(None, vec, false, false).unwrap();
    let bytes = builder.finish().unwrap().to_vec();

    let vector = get_root(&bytes).unwrap().as_vector();
    assert_eq!(vector.byte_width(), 2);
    for (i, element) in vector.iter().enumerate() {
        assert_eq!(element.unwrap().as_str(), format!("value-{}", i));
    }
}

#[test]
fn long_string_uses_wide_length_prefix() {
    let text = "x".repeat(300);
    let mut builder = Builder::new();
    builder.put_string(None, &text).unwrap();
    let bytes = builder.finish().unwrap().to_vec();
    let root = get_root(&bytes).unwrap();
    assert_eq!(root.byte_width(), 2);
    assert_eq!(root.as_str(), text);
}

#[test]
fn build_clear_build_is_byte_identical() {
    fn build(builder: &mut Builder) -> Vec<u8> {
        let map = builder.start_map().unwrap();
        builder.put_string(Some("s"), "shared").unwrap();
        builder.put_string(Some("t"), "shared").unwrap();
        builder.put_double(Some("f"), 1.25).unwrap();
        builder.end_map(None, map).unwrap();
        builder.finish().unwrap().to_vec()
    }

    let mut builder = BuilderOptions::new()
        .flags(BuilderFlags::SHARE_KEYS_AND_STRINGS)
        .build();
    let first = build(&mut builder);
    builder.clear();
    let second = build(&mut builder);
    assert_eq!(first, second);
    assert_eq!(builder.flags(), BuilderFlags::SHARE_KEYS_AND_STRINGS);
}

#[test]
fn shared_strings_resolve_to_one_offset() {
    fn offsets(flags: BuilderFlags) -> (usize, usize) {
        let mut builder = Builder::with_flags(flags);
        let vec = builder.start_vector().unwrap();
        builder.put_string(None, "Fred").unwrap();
        builder.put_string(None, "Fred").unwrap();
        builder.end_vector(None, vec, false, false).unwrap();
        let bytes = builder.finish().unwrap().to_vec();
        let vector = get_root(&bytes).unwrap().as_vector();
        (
            vector.get(0).unwrap().data_offset(),
            vector.get(1).unwrap().data_offset(),
        )
    }

    let (a, b) = offsets(BuilderFlags::SHARE_STRINGS);
    assert_eq!(a, b);
    let (a, b) = offsets(BuilderFlags::NONE);
    assert_ne!(a, b);
}

#[test]
fn shared_keys_resolve_to_one_offset() {
    fn offsets(flags: BuilderFlags) -> (usize, usize) {
        let mut builder = Builder::with_flags(flags);
        let vec = builder.start_vector().unwrap();
        for v in 0..2 {
            let map = builder.start_map().unwrap();
            builder.put_int(Some("x"), v).unwrap();
            builder.end_map(None, map).unwrap();
        }
        builder.end_vector(None, vec, false, false).unwrap();
        let bytes = builder.finish().unwrap().to_vec();
        let vector = get_root(&bytes).unwrap().as_vector();
        let first = vector.get(0).unwrap().as_map().keys().get(0).unwrap();
        let second = vector.get(1).unwrap().as_map().keys().get(0).unwrap();
        assert_eq!(first, second);
        (first.offset(), second.offset())
    }

    let (a, b) = offsets(BuilderFlags::SHARE_KEYS);
    assert_eq!(a, b);
    let (a, b) = offsets(BuilderFlags::NONE);
    assert_ne!(a, b);
}

#[test]
fn fixed_buffer_overflow_poisons_until_clear() {
    let mut builder = BuilderOptions::new().fixed_capacity(1).build();
    let err = builder.put_string(None, "hello").unwrap_err();
    assert!(kind(&err).is_some_and(|e| e.is_overflow()));

    let err = builder.put_int(None, 1).unwrap_err();
    assert!(is_structural(&err));
    assert!(builder.finish().is_err());

    builder.clear();
    assert!(builder.is_empty());
    builder.put_null(None).unwrap();
}

#[test]
fn fixed_buffer_with_room_finishes() {
    let mut builder = BuilderOptions::new().fixed_capacity(16).build();
    builder.put_string(None, "abc").unwrap();
    assert_eq!(builder.finish().unwrap().len(), 8);
}

#[test]
fn keys_outside_maps_are_rejected() {
    let mut builder = Builder::new();
    let err = builder.put_int(Some("a"), 1).unwrap_err();
    assert!(is_structural(&err));

    let vec = builder.start_vector().unwrap();
    let err = builder.put_string(Some("a"), "x").unwrap_err();
    assert!(is_structural(&err));
    let inner = builder.start_vector().unwrap();
    let err = builder.end_vector(Some("k"), inner, false, false).unwrap_err();
    assert!(is_structural(&err));
    builder.end_vector(None, inner, false, false).unwrap();
    builder.end_vector(None, vec, false, false).unwrap();
    assert!(builder.finish().is_ok());
}

#[test]
fn map_entries_need_keys() {
    let mut builder = Builder::new();
    let map = builder.start_map().unwrap();
    builder.put_int(None, 1).unwrap();
    let err = builder.end_map(None, map).unwrap_err();
    assert!(is_structural(&err));
}

#[test]
fn keys_with_nul_are_invalid() {
    let mut builder = Builder::new();
    let map = builder.start_map().unwrap();
    let err = builder.put_int(Some("a\0b"), 1).unwrap_err();
    assert_eq!(kind(&err), Some(&FlexError::InvalidKey));
    builder.put_int(Some("ab"), 1).unwrap();
    builder.end_map(None, map).unwrap();
    builder.finish().unwrap();
}

#[test]
fn mismatched_handles_are_structural_errors() {
    let mut builder = Builder::new();
    let outer = builder.start_vector().unwrap();
    let inner = builder.start_map().unwrap();
    assert!(is_structural(&builder.end_vector(None, outer, false, false).unwrap_err()));
    assert!(is_structural(&builder.end_vector(None, inner, false, false).unwrap_err()));
    builder.end_map(None, inner).unwrap();
    assert!(is_structural(&builder.end_map(None, outer).unwrap_err()));
    builder.end_vector(None, outer, false, false).unwrap();
}

#[test]
fn finish_requires_exactly_one_closed_root() {
    let mut builder = Builder::new();
    assert!(is_structural(&builder.finish().unwrap_err()));

    let vec = builder.start_vector().unwrap();
    assert!(is_structural(&builder.finish().unwrap_err()));
    builder.end_vector(None, vec, false, false).unwrap();

    builder.put_int(None, 1).unwrap();
    assert!(is_structural(&builder.finish().unwrap_err()));
}

#[test]
fn writes_after_finish_are_rejected() {
    let mut builder = Builder::new();
    builder.put_int(None, 1).unwrap();
    builder.finish().unwrap();
    assert!(builder.is_finished());
    assert!(is_structural(&builder.put_int(None, 2).unwrap_err()));
    assert!(is_structural(&builder.start_vector().unwrap_err()));
    builder.clear();
    assert!(!builder.is_finished());
    builder.put_int(None, 2).unwrap();
    assert_eq!(builder.finish().unwrap(), &[0x02, 0x04, 0x01]);
}

#[test]
fn conversions_follow_fallback_table() {
    let mut builder = Builder::new();
    let map = builder.start_map().unwrap();
    builder.put_string(Some("num"), "42").unwrap();
    builder.put_string(Some("float"), "2.5").unwrap();
    builder.put_string(Some("word"), "abc").unwrap();
    builder.put_null(Some("null")).unwrap();
    builder.put_bool(Some("yes"), true).unwrap();
    builder.put_double(Some("pi"), 3.75).unwrap();
    builder.put_blob(Some("blob"), b"raw").unwrap();
    let vec = builder.start_vector().unwrap();
    builder.put_int(None, 1).unwrap();
    builder.put_int(None, 2).unwrap();
    builder.end_vector(Some("vec"), vec, false, false).unwrap();
    builder.end_map(None, map).unwrap();
    let bytes = builder.finish().unwrap().to_vec();

    let root = get_root(&bytes).unwrap();
    let map = root.as_map();
    assert_eq!(map.get("num").unwrap().as_i64(), 42);
    assert_eq!(map.get("float").unwrap().as_f64(), 2.5);
    assert_eq!(map.get("word").unwrap().as_i64(), 0);
    assert!(!map.get("word").unwrap().as_bool());
    assert_eq!(map.get("null").unwrap().as_u64(), 0);
    assert_eq!(map.get("null").unwrap().as_str(), "");
    assert_eq!(map.get("yes").unwrap().as_i64(), 1);
    assert_eq!(map.get("pi").unwrap().as_i64(), 3);
    assert_eq!(map.get("pi").unwrap().as_str(), "");
    assert_eq!(map.get("blob").unwrap().as_i64(), 0);
    assert_eq!(map.get("blob").unwrap().as_str(), "");
    assert_eq!(map.get("num").unwrap().as_blob().as_bytes(), b"42");
    assert_eq!(map.get("vec").unwrap().as_u64(), 2);
    assert!(map.get("vec").unwrap().as_bool());
    assert!(map.get("vec").unwrap().as_map().is_empty());
    assert!(map.get("pi").unwrap().as_vector().is_empty());
    assert!(map.get("pi").unwrap().as_key().is_empty());
    assert_eq!(root.as_u64(), 8);
    assert_eq!(root.as_vector().len(), 8);
}

#[test]
fn key_references_read_as_text() {
    let mut builder = Builder::new();
    let map = builder.start_map().unwrap();
    builder.put_int(Some("hello"), 1).unwrap();
    builder.end_map(None, map).unwrap();
    let bytes = builder.finish().unwrap().to_vec();

    let key = get_root(&bytes).unwrap().as_map().keys().get(0).unwrap();
    assert_eq!(key, "hello");
    assert_eq!(key.as_str(), "hello");
    assert_eq!(&bytes[key.offset()..key.offset() + 5], b"hello");
}

#[test]
fn display_matches_textual_form() {
    let mut builder = Builder::new();
    let map = builder.start_map().unwrap();
    builder.put_int(Some("k"), 1).unwrap();
    let vec = builder.start_vector().unwrap();
    builder.put_int(None, 99).unwrap();
    builder.put_string(None, "wow").unwrap();
    builder.end_vector(Some("v"), vec, false, false).unwrap();
    builder.put_string(Some("q"), "say \"hi\"\n").unwrap();
    builder.end_map(None, map).unwrap();
    let bytes = builder.finish().unwrap().to_vec();

    let root = get_root(&bytes).unwrap();
    assert_eq!(
        root.to_string(),
        r#"{ "k" : 1, "q" : "say \"hi\"\n", "v" : [ 99, "wow" ] }"#
    );
    assert_eq!(
        root.as_map().get("v").unwrap().as_vector().to_string(),
        r#"[ 99, "wow" ]"#
    );
}

#[test]
fn blob_prints_bare_and_quoted_as_a_value() {
    let mut builder = Builder::new();
    builder.put_blob(None, b"AC").unwrap();
    let bytes = builder.finish().unwrap().to_vec();

    let root = get_root(&bytes).unwrap();
    assert_eq!(root.as_blob().to_string(), "AC");
    assert_eq!(root.to_string(), "\"AC\"");
}

#[test]
fn large_and_small_floats_print_in_exponent_form() {
    let near_max = f64::from_bits(0x7FEF_FFFB_BBFF_FFFF);
    let mut builder = Builder::new();
    let map = builder.start_map().unwrap();
    builder.put_double(Some("big"), near_max).unwrap();
    builder.put_double(Some("mid"), 2.5).unwrap();
    builder.put_double(Some("tiny"), 0.000_25).unwrap();
    builder.end_map(None, map).unwrap();
    let bytes = builder.finish().unwrap().to_vec();

    let root = get_root(&bytes).unwrap();
    assert_eq!(root.as_map().get("big").unwrap().as_f64(), near_max);
    assert_eq!(
        root.to_string(),
        r#"{ "big" : 1.7976894783391937E308, "mid" : 2.5, "tiny" : 2.5E-4 }"#
    );
}

#[test]
fn get_root_rejects_malformed_buffers() {
    let format = |bytes: &[u8]| {
        let err = get_root(bytes).unwrap_err();
        matches!(kind(&err), Some(FlexError::Format(_)))
    };
    assert!(format(&[]));
    assert!(format(&[0x01, 0x04]));
    assert!(format(&[0x00, 0x04, 0x03]));
    assert!(format(&[0x00, 0x6c, 0x01]));
    assert!(format(&[0x05, 0x14, 0x01]));
    assert!(format(&[0x00, 0x04, 0x08]));
    // string whose length prefix runs past the end
    assert!(format(&[0xff, b'a', 0x01, 0x14, 0x01]));
    // vector claiming 200 elements
    assert!(format(&[0xc8, 0x01, 0x01, 0x28, 0x01]));
}

#[test]
fn json_value_roundtrip() {
    let text = r#"{"a":[1,2.5,"x",null,true],"b":{"c":18446744073709551615,"d":-3}}"#;
    let bytes = from_json_str(text, BuilderFlags::default()).unwrap();
    let expected: serde_json::Value = serde_json::from_str(text).unwrap();
    let decoded = get_root(&bytes).unwrap().to_json_value().unwrap();
    assert_eq!(decoded, expected);
}

#[test]
fn json_renders_blobs_as_byte_arrays() {
    let mut builder = Builder::new();
    builder.put_blob(None, &[0, 255]).unwrap();
    let bytes = builder.finish().unwrap().to_vec();
    let value = get_root(&bytes).unwrap().to_json_value().unwrap();
    assert_eq!(value, serde_json::json!([0, 255]));
}

#[test]
fn invalid_json_is_an_error() {
    assert!(from_json_str("{not json", BuilderFlags::NONE).is_err());
}
