//! HMAC-SHA256 signing and verification of EventSub webhook requests.
//!
//! Twitch signs `message_id ‖ timestamp ‖ raw body` (no separators) with the
//! webhook secret and sends the result in `Twitch-Eventsub-Message-Signature`
//! as `sha256=<hex>`.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

fn message_mac(secret: &str, message_id: &str, timestamp: &str, body: &[u8]) -> HmacSha256 {
    let mut mac = <HmacSha256 as KeyInit>::new_from_slice(secret.as_bytes())
        .expect("HMAC-SHA256 accepts keys of any size");
    mac.update(message_id.as_bytes());
    mac.update(timestamp.as_bytes());
    mac.update(body);
    mac
}

/// Computes the header value Twitch would send for this message.
pub fn sign(secret: &str, message_id: &str, timestamp: &str, body: &[u8]) -> String {
    let mac = message_mac(secret, message_id, timestamp, body);
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()))
}

/// Checks a received signature header in constant time.
///
/// Anything malformed (missing prefix, bad hex, wrong length) is simply `false`.
pub fn verify(secret: &str, message_id: &str, timestamp: &str, body: &[u8], received: &str) -> bool {
    let Some(hex_sig) = received.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(received_bytes) = hex::decode(hex_sig) else {
        return false;
    };

    message_mac(secret, message_id, timestamp, body)
        .verify_slice(&received_bytes)
        .is_ok()
}
