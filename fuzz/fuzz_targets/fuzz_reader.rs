//! Fuzz testing for the reader.
//!
//! Feeds arbitrary bytes to `get_root` and walks whatever validates. Malformed
//! input must surface as an error, never as a panic or out-of-bounds read.

#![no_main]

use libfuzzer_sys::fuzz_target;

use flexbuf::{get_root, Reference};

/// Values visited per input; shared children make the tree larger than the
/// buffer.
const NODE_BUDGET: usize = 4096;

fn walk(reference: Reference<'_>, budget: &mut usize) {
    if *budget == 0 {
        return;
    }
    *budget -= 1;

    let _ = reference.as_bool();
    let _ = reference.as_u64();
    let _ = reference.as_f64();
    let _ = reference.as_str();
    let _ = reference.as_blob();
    let _ = reference.as_key();

    for element in reference.as_vector().iter().flatten() {
        walk(element, budget);
        if *budget == 0 {
            return;
        }
    }
    let map = reference.as_map();
    for key in map.keys().iter().flatten() {
        let _ = map.get_bytes(key.as_bytes());
    }
    let _ = map.get("absent-key");
}

fuzz_target!(|data: &[u8]| {
    if let Ok(root) = get_root(data) {
        let mut budget = NODE_BUDGET;
        walk(root, &mut budget);
        if data.len() < 256 {
            let _ = root.to_string();
            let _ = root.to_json_value();
        }
    }
});
