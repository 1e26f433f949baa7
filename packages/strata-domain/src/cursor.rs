use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use time::OffsetDateTime;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CursorPayload {
	offset: u32,
	query_fingerprint: String,
	expires_at: Option<i64>,
}

/// Signs `{offset, queryFingerprint, expiresAt}` with HMAC-SHA256 and base64url-encodes the
/// payload and signature together. Opaque to callers; never include anything here that a client
/// should be able to read.
pub fn sign(secret: &[u8], offset: u32, query_fingerprint: &str, expires_at: Option<OffsetDateTime>) -> String {
	let payload = CursorPayload {
		offset,
		query_fingerprint: query_fingerprint.to_string(),
		expires_at: expires_at.map(|ts| ts.unix_timestamp()),
	};
	let payload_bytes =
		serde_json::to_vec(&payload).expect("CursorPayload is always serializable");
	let signature = sign_bytes(secret, &payload_bytes);

	let mut framed = Vec::with_capacity(payload_bytes.len() + signature.len() + 1);

	framed.extend_from_slice(&(payload_bytes.len() as u32).to_be_bytes());
	framed.extend_from_slice(&payload_bytes);
	framed.extend_from_slice(&signature);

	URL_SAFE_NO_PAD.encode(framed)
}

pub struct VerifiedCursor {
	pub offset: u32,
	pub query_fingerprint: String,
}

/// Verifies the signature, decodes the payload, checks expiry, and requires the fingerprint to
/// match `expected_fingerprint`. Any disagreement is `CursorInvalid`, except an expired-but-valid
/// signature, which is `CursorExpired`.
pub fn verify(secret: &[u8], cursor: &str, expected_fingerprint: &str) -> Result<VerifiedCursor> {
	let framed = URL_SAFE_NO_PAD.decode(cursor).map_err(|_| Error::CursorInvalid)?;

	if framed.len() < 4 {
		return Err(Error::CursorInvalid);
	}

	let (len_bytes, rest) = framed.split_at(4);
	let payload_len = u32::from_be_bytes(len_bytes.try_into().unwrap()) as usize;

	if rest.len() < payload_len {
		return Err(Error::CursorInvalid);
	}

	let (payload_bytes, signature) = rest.split_at(payload_len);
	let expected_signature = sign_bytes(secret, payload_bytes);

	if signature.len() != expected_signature.len()
		|| !constant_time_eq(signature, &expected_signature)
	{
		return Err(Error::CursorInvalid);
	}

	let payload: CursorPayload =
		serde_json::from_slice(payload_bytes).map_err(|_| Error::CursorInvalid)?;

	if payload.query_fingerprint != expected_fingerprint {
		return Err(Error::CursorInvalid);
	}

	if let Some(expires_at) = payload.expires_at
		&& expires_at < OffsetDateTime::now_utc().unix_timestamp()
	{
		return Err(Error::CursorExpired);
	}

	Ok(VerifiedCursor { offset: payload.offset, query_fingerprint: payload.query_fingerprint })
}

fn sign_bytes(secret: &[u8], data: &[u8]) -> Vec<u8> {
	let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts a key of any length");

	mac.update(data);
	mac.finalize().into_bytes().to_vec()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
	a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
