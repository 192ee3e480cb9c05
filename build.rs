use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/ffi.rs");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let Ok(crate_dir) = env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let crate_dir = PathBuf::from(crate_dir);

    // Output to include/pronounce.h for the app shell
    let output_file = crate_dir.join("include").join("pronounce.h");

    let config = cbindgen::Config::from_file(crate_dir.join("cbindgen.toml")).unwrap_or_default();

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            if let Some(parent) = output_file.parent()
                && std::fs::create_dir_all(parent).is_ok()
            {
                bindings.write_to_file(&output_file);
                println!("cargo:warning=Generated C header: {}", output_file.display());
            }
        }
        // header generation is optional for Rust-only builds
        Err(e) => println!("cargo:warning=C header not generated: {e}"),
    }
}
