// Build script for chore-service
// Compiles chore_service.proto for gRPC server and client code generation
fn main() {
    println!("cargo:rerun-if-changed=../proto/services/chore_service.proto");

    let descriptor_path = std::path::PathBuf::from(std::env::var("OUT_DIR").unwrap())
        .join("chore_service_descriptor.bin");

    // Client code is also generated for integration tests; the descriptor
    // set feeds server reflection.
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(descriptor_path)
        .compile_protos(
            &["../proto/services/chore_service.proto"],
            &["../proto/services"],
        )
        .expect("Failed to compile chore_service.proto for chore-service");
}
