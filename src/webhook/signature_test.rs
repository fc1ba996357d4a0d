use super::*;

const SECRET: &[u8] = b"It's a Secret to Everybody";
const BODY: &[u8] = b"Hello, World!";
// Reference pair published in GitHub's webhook validation docs.
const EXPECTED: &str = "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";

#[test]
fn sign_matches_reference_vector() {
    assert_eq!(sign(SECRET, BODY), EXPECTED);
}

#[test]
fn verify_accepts_valid_signature() {
    assert_eq!(verify(SECRET, BODY, Some(EXPECTED)), Ok(()));
}

#[test]
fn verify_rejects_missing_header() {
    assert_eq!(verify(SECRET, BODY, None), Err(SignatureError::Missing));
}

#[test]
fn verify_rejects_tampered_body() {
    assert_eq!(verify(SECRET, b"Hello, World?", Some(EXPECTED)), Err(SignatureError::Invalid));
}

#[test]
fn verify_rejects_wrong_secret() {
    assert_eq!(verify(b"other", BODY, Some(EXPECTED)), Err(SignatureError::Invalid));
}

#[test]
fn verify_rejects_wrong_prefix_and_bad_hex() {
    let sha1 = EXPECTED.replacen("sha256=", "sha1=", 1);
    assert_eq!(verify(SECRET, BODY, Some(&sha1)), Err(SignatureError::Invalid));
    assert_eq!(verify(SECRET, BODY, Some("sha256=zz")), Err(SignatureError::Invalid));
    assert_eq!(verify(SECRET, BODY, Some("sha256=")), Err(SignatureError::Invalid));
}

#[test]
fn verify_rejects_truncated_digest() {
    let truncated = &EXPECTED[..EXPECTED.len() - 2];
    assert_eq!(verify(SECRET, BODY, Some(truncated)), Err(SignatureError::Invalid));
}

#[test]
fn error_messages_match_http_responses() {
    assert_eq!(SignatureError::Missing.to_string(), "Signature is missing");
    assert_eq!(SignatureError::Invalid.to_string(), "Invalid signature");
}
