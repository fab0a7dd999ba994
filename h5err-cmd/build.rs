// The version reported by `h5err --version` is the one the bundled library was built as.
fn main() {
    let (major, minor, patch) = hdf5::library_version();
    println!("cargo::rustc-env=H5_VERSION={major}.{minor}.{patch}");
    println!("cargo::rerun-if-changed=build.rs");
}
