//! Property-based tests: write-then-read returns the original value in both
//! notations across generated inputs.

use jsv_text::{json, jsv, reflect_composite, Reflect};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::fmt::Debug;

fn roundtrip<T: Reflect + PartialEq + Debug>(value: &T) -> bool {
    let jsv_ok = match jsv::to_string(value) {
        Ok(text) => match jsv::from_str::<T>(&text) {
            Ok(back) => *value == back,
            Err(e) => {
                eprintln!("JSV read failed: {} (text was {})", e, text);
                false
            }
        },
        Err(e) => {
            eprintln!("JSV write failed: {}", e);
            false
        }
    };
    let json_ok = match json::to_string(value) {
        Ok(text) => match json::from_str::<T>(&text) {
            Ok(back) => *value == back,
            Err(e) => {
                eprintln!("JSON read failed: {} (text was {})", e, text);
                false
            }
        },
        Err(e) => {
            eprintln!("JSON write failed: {}", e);
            false
        }
    };
    jsv_ok && json_ok
}

#[derive(Default, Debug, PartialEq, Clone)]
struct Record {
    id: i64,
    label: String,
    scores: Vec<i32>,
    parent: Option<u32>,
}

reflect_composite!(Record {
    "Id" => id,
    "Label" => label,
    "Scores" => scores,
    "Parent" => parent,
});

// structural characters of both notations, plus plain text
const TEXT: &str = "[a-zA-Z0-9 ,:\"{}\\[\\]\\\\]{0,16}";

proptest! {
    #[test]
    fn prop_i32(n in any::<i32>()) {
        prop_assert!(roundtrip(&n));
    }

    #[test]
    fn prop_i64(n in any::<i64>()) {
        prop_assert!(roundtrip(&n));
    }

    #[test]
    fn prop_u64(n in any::<u64>()) {
        prop_assert!(roundtrip(&n));
    }

    #[test]
    fn prop_bool(b in any::<bool>()) {
        prop_assert!(roundtrip(&b));
    }

    #[test]
    fn prop_f64(f in -1.0e12f64..1.0e12f64) {
        prop_assert!(roundtrip(&f));
    }

    #[test]
    fn prop_string(s in TEXT) {
        prop_assert!(roundtrip(&s));
    }

    #[test]
    fn prop_vec_i32(v in prop::collection::vec(any::<i32>(), 0..20)) {
        prop_assert!(roundtrip(&v));
    }

    #[test]
    fn prop_vec_string(v in prop::collection::vec(TEXT, 0..8)) {
        prop_assert!(roundtrip(&v));
    }

    #[test]
    fn prop_option_i32(opt in proptest::option::of(any::<i32>())) {
        prop_assert!(roundtrip(&opt));
    }

    #[test]
    fn prop_map(m in prop::collection::btree_map("[a-z:, ]{1,8}", any::<i32>(), 0..8)) {
        let m: BTreeMap<String, i32> = m;
        prop_assert!(roundtrip(&m));
    }

    #[test]
    fn prop_record(
        id in any::<i64>(),
        label in TEXT,
        scores in prop::collection::vec(any::<i32>(), 0..6),
        parent in proptest::option::of(any::<u32>()),
    ) {
        let record = Record { id, label, scores, parent };
        prop_assert!(roundtrip(&record));
    }
}
