//! Build script.
//!
//! Generates the Workflow Client's gRPC stub from `protos/workflow_engine.proto`.
//! Only runs when the `grpc` feature is enabled.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "grpc")]
    compile_protos()?;

    Ok(())
}

#[cfg(feature = "grpc")]
fn compile_protos() -> Result<(), Box<dyn std::error::Error>> {
    use std::path::PathBuf;

    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path().unwrap());

    let proto = "protos/workflow_engine.proto";
    if !PathBuf::from(proto).exists() {
        println!("cargo:warning=workflow_engine.proto not found, skipping gRPC code generation");
        return Ok(());
    }

    let out_dir = PathBuf::from("src/proto");
    std::fs::create_dir_all(&out_dir)?;

    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .out_dir(&out_dir)
        .compile(&[proto], &["protos"])?;

    println!("cargo:rerun-if-changed={proto}");

    Ok(())
}
