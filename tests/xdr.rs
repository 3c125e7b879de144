use gmetric::protocol::{encode_metadata, encode_value, padding, XdrWriter};
use gmetric::{MetricIdentity, Slope, ValueType};
use proptest::prelude::*;

mod utils;
use utils::{PacketReader, METADATA_KIND, VALUE_KIND};

fn arb_value_type() -> impl Strategy<Value = ValueType> {
    prop_oneof![
        Just(ValueType::String),
        Just(ValueType::Int32),
        Just(ValueType::Float),
        Just(ValueType::Double),
    ]
}

fn arb_slope() -> impl Strategy<Value = Slope> {
    prop_oneof![
        Just(Slope::Zero),
        Just(Slope::Positive),
        Just(Slope::Negative),
        Just(Slope::Both),
        Just(Slope::Unspecified),
    ]
}

proptest! {
    #[test]
    fn test_write_string_framing(s in ".*") {
        let mut writer = XdrWriter::new();
        writer.write_string(&s);
        let bytes = writer.into_bytes();

        let len = s.len();
        prop_assert_eq!(4 + len + padding(len), bytes.len());
        prop_assert_eq!(0, bytes.len() % 4);
        prop_assert_eq!(&(len as u32).to_be_bytes()[..], &bytes[..4]);
        prop_assert_eq!(s.as_bytes(), &bytes[4..4 + len]);
        prop_assert!(bytes[4 + len..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_metadata_fields(
        host in "[a-z0-9.-]{1,24}",
        name in "[a-zA-Z0-9_]{1,32}",
        units in "[a-zA-Z/ ]{0,12}",
        value_type in arb_value_type(),
        slope in arb_slope(),
        tmax in any::<u32>(),
        dmax in any::<u32>(),
    ) {
        let id = MetricIdentity::new(host.as_str(), &name, value_type, units.as_str(), slope)
            .unwrap()
            .with_tmax(tmax)
            .with_dmax(dmax);
        let packet = encode_metadata(&id);
        let mut reader = PacketReader::new(&packet);

        prop_assert_eq!(0, packet.len() % 4);
        prop_assert_eq!(METADATA_KIND, reader.read_uint());
        prop_assert_eq!(host, reader.read_string());
        prop_assert_eq!(&name, &reader.read_string());
        prop_assert_eq!(0, reader.read_uint());
        prop_assert_eq!(value_type.as_str(), reader.read_string());
        prop_assert_eq!(&name, &reader.read_string());
        prop_assert_eq!(units, reader.read_string());
        prop_assert_eq!(slope.code(), reader.read_uint());
        prop_assert_eq!(tmax, reader.read_uint());
        prop_assert_eq!(dmax, reader.read_uint());
        prop_assert_eq!(0, reader.read_uint());
        prop_assert!(reader.is_done());
    }

    #[test]
    fn test_value_fields(value in ".*", value_type in arb_value_type()) {
        let id = MetricIdentity::new("localhost", "metric", value_type, "", Slope::Both).unwrap();
        let packet = encode_value(&id, &value);
        let mut reader = PacketReader::new(&packet);

        prop_assert_eq!(VALUE_KIND, reader.read_uint());
        prop_assert_eq!("localhost", reader.read_string());
        prop_assert_eq!("metric", reader.read_string());
        prop_assert_eq!(0, reader.read_uint());
        prop_assert_eq!("%s", reader.read_string());
        prop_assert_eq!(value, reader.read_string());
        prop_assert!(reader.is_done());
    }
}
