use std::error::Error;
use vergen::EmitBuilder;

fn main() -> Result<(), Box<dyn Error>> {
    // source tarballs do not carry git metadata, so vergen falls back to its idempotent placeholder there
    EmitBuilder::builder()
        .all_git()
        .git_describe(true, false, None)
        .emit()?;

    // emit build handles the git configuration and build.rs, but we also need to track the toml, src, and fixture folders
    let rerun_if_changed = "cargo:rerun-if-changed=Cargo.toml
cargo:rerun-if-changed=src
cargo:rerun-if-changed=test_data";
    println!("{rerun_if_changed}");

    Ok(())
}
