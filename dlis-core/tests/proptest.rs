//! Property-based tests using proptest

mod common;

use bytes::Bytes;
use dlis_core::constants::SegmentAttributes;
use dlis_core::cursor::Cursor;
use dlis_core::eflr::parse_eflr;
use dlis_core::types::Value;
use dlis_core::{Catalog, DecodeOptions, LogicalRecords, RepCode};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_record_walk_never_panics(
        data in prop::collection::vec(any::<u8>(), 0..8192)
    ) {
        // Walking arbitrary bytes yields records or errors, never a panic
        let records = LogicalRecords::without_label(Bytes::from(data), DecodeOptions::default());
        for item in records {
            prop_assert!(item.is_ok() || item.is_err());
        }
    }

    #[test]
    fn prop_catalog_never_panics(
        data in prop::collection::vec(any::<u8>(), 0..8192)
    ) {
        let _ = Catalog::build(Bytes::from(data), DecodeOptions::default());
    }

    #[test]
    fn prop_eflr_parse_never_panics(
        data in prop::collection::vec(any::<u8>(), 0..2048)
    ) {
        let mut warnings = Vec::new();
        let result = parse_eflr(&data, &mut warnings);
        prop_assert!(result.is_ok() || result.is_err());
    }

    #[test]
    fn prop_value_decode_never_panics(
        code in 1u8..=27,
        data in prop::collection::vec(any::<u8>(), 0..64)
    ) {
        let code = RepCode::try_from(code).unwrap();
        let result = code.decode(&mut Cursor::new(&data));
        prop_assert!(result.is_ok() || result.is_err());
    }

    #[test]
    fn prop_integers_round_trip(
        signed in any::<i32>(),
        unsigned in any::<u32>(),
        variable in 0u32..0x4000_0000,
    ) {
        for (code, value) in [
            (RepCode::Slong, Value::I32(signed)),
            (RepCode::Snorm, Value::I16(signed as i16)),
            (RepCode::Sshort, Value::I8(signed as i8)),
            (RepCode::Ulong, Value::U32(unsigned)),
            (RepCode::Unorm, Value::U16(unsigned as u16)),
            (RepCode::Ushort, Value::U8(unsigned as u8)),
            (RepCode::Uvari, Value::U32(variable)),
        ] {
            let bytes = common::encode_value(code, &value);
            let decoded = code.decode(&mut Cursor::new(&bytes)).unwrap();
            prop_assert_eq!(decoded, value);
        }
    }

    #[test]
    fn prop_ieee_floats_round_trip(
        single in any::<f32>().prop_filter("finite", |f| f.is_finite()),
        double in any::<f64>().prop_filter("finite", |f| f.is_finite()),
    ) {
        let bytes = common::encode_value(RepCode::Fsingl, &Value::F32(single));
        prop_assert_eq!(
            RepCode::Fsingl.decode(&mut Cursor::new(&bytes)).unwrap(),
            Value::F32(single)
        );

        let bytes = common::encode_value(RepCode::Fdoubl, &Value::F64(double));
        prop_assert_eq!(
            RepCode::Fdoubl.decode(&mut Cursor::new(&bytes)).unwrap(),
            Value::F64(double)
        );
    }

    #[test]
    fn prop_idents_round_trip(s in "[A-Z0-9 ._-]{0,64}") {
        let value = Value::String(s);
        let bytes = common::encode_value(RepCode::Ident, &value);
        prop_assert_eq!(
            RepCode::Ident.decode(&mut Cursor::new(&bytes)).unwrap(),
            value
        );
    }

    #[test]
    fn prop_reassembly_is_split_point_invariant(
        payload in prop::collection::vec(any::<u8>(), 2..512),
        split in any::<proptest::sample::Index>(),
    ) {
        // one record, whole
        let whole = common::visible_record(
            &[common::segment(SegmentAttributes::EXPLICIT, 3, &payload)],
        );

        // the same record split at an arbitrary point, one visible record
        // per segment
        let (a, b) = payload.split_at(split.index(payload.len()));
        let mut split_stream = common::visible_record(&[common::segment(
            SegmentAttributes::EXPLICIT | SegmentAttributes::HAS_SUCCESSOR,
            3,
            a,
        )]);
        split_stream.extend(common::visible_record(&[common::segment(
            SegmentAttributes::EXPLICIT | SegmentAttributes::HAS_PREDECESSOR,
            3,
            b,
        )]));

        let collect = |stream: Vec<u8>| -> Vec<Bytes> {
            LogicalRecords::without_label(Bytes::from(stream), DecodeOptions::default())
                .map(|r| r.unwrap().body)
                .collect()
        };

        prop_assert_eq!(collect(whole), collect(split_stream));
    }
}
