/// gRPC server implementation for chore-service
pub mod server;

pub use server::ChoreServer;

// Import generated protobuf types
pub mod chorepoints {
    pub mod v1 {
        tonic::include_proto!("chorepoints.v1");
    }
}

/// Encoded file descriptor set, registered with the reflection service.
pub const FILE_DESCRIPTOR_SET: &[u8] =
    tonic::include_file_descriptor_set!("chore_service_descriptor");
