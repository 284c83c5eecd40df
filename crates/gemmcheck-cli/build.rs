use vergen::EmitBuilder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // VERGEN_RUSTC_SEMVER and VERGEN_CARGO_TARGET_TRIPLE feed `--version`.
    EmitBuilder::builder().rustc_semver().cargo_target_triple().emit()?;
    Ok(())
}
