fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use the vendored protoc unless one is configured explicitly
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/rmbridge/v1/client_rm.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/rmbridge/v1/client_rm.proto");

    Ok(())
}
