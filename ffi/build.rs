use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let header = PathBuf::from(&crate_dir).join("include").join("xhr_ffi.h");

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("XHR_FFI_H")
        .with_pragma_once(true)
        .generate()
    {
        Ok(bindings) => {
            if let Some(dir) = header.parent() {
                if let Err(err) = std::fs::create_dir_all(dir) {
                    println!("cargo:warning=could not create {}: {err}", dir.display());
                }
            }
            bindings.write_to_file(&header);
        }
        // A missing header must not break the Rust build.
        Err(err) => println!("cargo:warning=cbindgen could not generate {}: {err}", header.display()),
    }
}
