#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use mqtt_codec::{MqttCodec, Packet};
use tokio_util::codec::Decoder;

/// CONNECT credentials whose flag is set but whose value arrived as a
/// zero-length string. The encoder omits those fields.
fn elides_credentials(packet: &Packet) -> bool {
    matches!(packet, Packet::Connect(c)
        if (c.username_flag() && c.username().is_empty())
            || (c.password_flag() && c.password().is_empty()))
}

fuzz_target!(|data: &[u8]| {
    // Must never panic; anything that decodes must re-encode to the same packet
    if let Ok((n, packet)) = Packet::decode_slice(data) {
        match packet.to_bytes() {
            Ok(encoded) => {
                let (_, again) = Packet::decode_slice(&encoded).expect("re-encoded frame decodes");
                assert_eq!(again, packet);

                if !elides_credentials(&packet) {
                    // Only the Remaining Length may differ, as the encoder writes it minimally
                    let frame = &data[..n];
                    let body_len = packet.remaining_length().expect("encodable packet has a length");
                    assert_eq!(encoded[0], frame[0]);
                    assert_eq!(&encoded[encoded.len() - body_len..], &frame[n - body_len..]);
                }
            }
            // A password behind an empty username cannot be written back
            Err(e) => assert!(elides_credentials(&packet), "{packet} failed to re-encode: {e}"),
        }
    }

    let mut codec = MqttCodec::new();
    let mut buf = BytesMut::from(data);
    while let Ok(Some(_)) = codec.decode(&mut buf) {}
});
