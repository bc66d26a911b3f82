//! Build script for storefront crate.
//!
//! Generates a content-based hash for the checkout script so browsers pick
//! up a new version as soon as it changes.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    hash_checkout_js();
}

/// Hash `static/js/checkout.js`.
///
/// Sets `CHECKOUT_JS_HASH` environment variable for use with
/// `env!("CHECKOUT_JS_HASH")`.
fn hash_checkout_js() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let js_path = Path::new(&manifest_dir).join("static/js/checkout.js");

    // Tell Cargo to rerun if checkout.js changes
    println!("cargo:rerun-if-changed={}", js_path.display());

    let content = match fs::read(&js_path) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read checkout.js: {e}");
            println!("cargo:rustc-env=CHECKOUT_JS_HASH=dev");
            return;
        }
    };

    // First 8 chars of SHA256
    let mut hasher = Sha256::new();
    hasher.update(&content);
    let hash = format!("{:x}", hasher.finalize());
    let short_hash = hash.get(..8).unwrap_or("dev");

    println!("cargo:rustc-env=CHECKOUT_JS_HASH={short_hash}");
}
