//! AWS Signature Version 4 signing for PA-API requests.
//!
//! Canonical request over the POST body, SHA-256 payload hash, signing key
//! derived by iterated HMAC over date/region/service/"aws4_request", and the
//! resulting Authorization header.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADER_LIST: &str = "content-encoding;content-type;host;x-amz-date;x-amz-target";

/// Everything the signature is computed over. The timestamp is explicit so
/// signing stays deterministic under test.
pub struct SigningParams<'a> {
    pub access_key: &'a str,
    pub secret_key: &'a str,
    pub host: &'a str,
    pub region: &'a str,
    pub service: &'a str,
    pub uri_path: &'a str,
    pub amz_target: &'a str,
    /// Exact JSON body that will be sent on the wire.
    pub payload: &'a str,
    pub signed_at: DateTime<Utc>,
}

/// Header values to attach to the signed request.
#[derive(Debug)]
pub struct SignedHeaders {
    pub amz_date: String,
    pub authorization: String,
}

pub fn sign(params: &SigningParams<'_>) -> SignedHeaders {
    let amz_date = params.signed_at.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = params.signed_at.format("%Y%m%d").to_string();

    let canonical_headers = format!(
        "content-encoding:amz-1.0\ncontent-type:application/json; charset=utf-8\nhost:{}\nx-amz-date:{}\nx-amz-target:{}\n",
        params.host, amz_date, params.amz_target
    );
    let payload_hash = hex_sha256(params.payload.as_bytes());
    // Query string is always empty for the search endpoint.
    let canonical_request = format!(
        "POST\n{}\n\n{}\n{}\n{}",
        params.uri_path, canonical_headers, SIGNED_HEADER_LIST, payload_hash
    );

    let credential_scope = format!(
        "{}/{}/{}/aws4_request",
        date_stamp, params.region, params.service
    );
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        credential_scope,
        hex_sha256(canonical_request.as_bytes())
    );

    let signing_key = derive_signing_key(
        params.secret_key,
        &date_stamp,
        params.region,
        params.service,
    );
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, params.access_key, credential_scope, SIGNED_HEADER_LIST, signature
    );

    SignedHeaders {
        amz_date,
        authorization,
    }
}

fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC-SHA256 accepts any key length");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
