#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # nebula-webhook
//!
//! Webhook ingress signature verification (§4.8): a configurable HMAC
//! verifier plus the four provider presets the spec names. Small and
//! self-contained by design -- webhook ingress itself (routing,
//! delivery retries, the HTTP surface) is out of scope (§1); this crate
//! only answers "is this request's signature valid".
//!
//! Every comparison goes through [`subtle::ConstantTimeEq`] so match
//! time does not leak how many leading bytes of a forged signature
//! happened to be correct (§8: "comparison time is independent of
//! mismatch position").

mod presets;
mod verifier;

pub use presets::{github, slack, stripe, twilio};
pub use verifier::{Algorithm, Encoding, SignatureVerifier};
