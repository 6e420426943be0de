//! Webhook signature scheme: header `t=<unix>,v1=<hex>`, HMAC-SHA256 over `"<t>." + body`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing signature header")]
    MissingHeader,
    #[error("signature header lacks a timestamp or v1 signature")]
    MalformedHeader,
    #[error("webhook secret is not configured")]
    NoSecret,
    #[error("no v1 signature matches the payload")]
    Mismatch,
    #[error("timestamp {0} is outside the tolerance window")]
    Stale(i64),
}

struct ParsedHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

fn parse_header(header: &str) -> Result<ParsedHeader<'_>, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = Some(t.parse::<i64>().map_err(|_| SignatureError::MalformedHeader)?);
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }
    match timestamp {
        Some(timestamp) if !signatures.is_empty() => Ok(ParsedHeader {
            timestamp,
            signatures,
        }),
        _ => Err(SignatureError::MalformedHeader),
    }
}

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> Result<Hmac<Sha256>, SignatureError> {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::NoSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Checks `header` against `payload`; `now` is unix seconds.
pub fn verify(
    payload: &[u8],
    header: Option<&str>,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::MissingHeader)?;
    if secret.is_empty() {
        return Err(SignatureError::NoSecret);
    }
    let parsed = parse_header(header)?;

    let mac = mac_for(secret, parsed.timestamp, payload)?;
    let matched = parsed.signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if !matched {
        return Err(SignatureError::Mismatch);
    }

    let tolerance = u64::try_from(tolerance_secs).unwrap_or(0);
    if now.abs_diff(parsed.timestamp) > tolerance {
        return Err(SignatureError::Stale(parsed.timestamp));
    }
    Ok(())
}

/// Builds a header value the way the processor does. Used by the fake gateway and tests.
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let digest = match mac_for(secret, timestamp, payload) {
        Ok(mac) => hex::encode(mac.finalize().into_bytes()),
        Err(_) => String::new(),
    };
    format!("t={timestamp},v1={digest}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn accepts_own_signature() {
        let header = sign(BODY, SECRET, NOW);
        assert_eq!(verify(BODY, Some(&header), SECRET, 300, NOW), Ok(()));
    }

    #[test]
    fn accepts_any_matching_v1_entry() {
        let good = sign(BODY, SECRET, NOW);
        let digest = good.split("v1=").nth(1).unwrap();
        let header = format!("t={NOW},v1=deadbeef,v1={digest},v0=ignored");
        assert_eq!(verify(BODY, Some(&header), SECRET, 300, NOW), Ok(()));
    }

    #[test]
    fn rejects_tampered_body() {
        let header = sign(BODY, SECRET, NOW);
        let tampered = br#"{"id":"evt_1","type":"payment_intent.canceled"}"#;
        assert_eq!(
            verify(tampered, Some(&header), SECRET, 300, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_wrong_secret() {
        let header = sign(BODY, "whsec_other", NOW);
        assert_eq!(
            verify(BODY, Some(&header), SECRET, 300, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_missing_or_malformed_headers() {
        assert_eq!(
            verify(BODY, None, SECRET, 300, NOW),
            Err(SignatureError::MissingHeader)
        );
        assert_eq!(
            verify(BODY, Some("garbage"), SECRET, 300, NOW),
            Err(SignatureError::MalformedHeader)
        );
        assert_eq!(
            verify(BODY, Some("t=abc,v1=00"), SECRET, 300, NOW),
            Err(SignatureError::MalformedHeader)
        );
        assert_eq!(
            verify(BODY, Some(&format!("t={NOW},v1=not-hex")), SECRET, 300, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_stale_timestamps() {
        let header = sign(BODY, SECRET, NOW - 301);
        assert_eq!(
            verify(BODY, Some(&header), SECRET, 300, NOW),
            Err(SignatureError::Stale(NOW - 301))
        );
    }

    #[test]
    fn extreme_timestamps_are_stale_not_a_panic() {
        for t in [i64::MIN, i64::MAX] {
            let header = sign(BODY, SECRET, t);
            assert_eq!(
                verify(BODY, Some(&header), SECRET, 300, NOW),
                Err(SignatureError::Stale(t))
            );
        }
    }

    #[test]
    fn empty_secret_rejects_everything() {
        let header = sign(BODY, "", NOW);
        assert_eq!(
            verify(BODY, Some(&header), "", 300, NOW),
            Err(SignatureError::NoSecret)
        );
    }
}
