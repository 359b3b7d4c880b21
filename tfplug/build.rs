//! Generates the tfplugin6 bindings from `proto/tfplugin6.proto`.
//!
//! When protoc is not available the messages come from the checked-in
//! `proto/tfplugin6.pb.rs` and only the Provider service is generated.

use std::process::Command;
use tonic_build::manual::{Builder, Method, Service};

/// (rust method / message module, gRPC route)
const RPCS: &[(&str, &str)] = &[
    ("get_metadata", "GetMetadata"),
    ("get_provider_schema", "GetProviderSchema"),
    ("validate_provider_config", "ValidateProviderConfig"),
    ("validate_resource_config", "ValidateResourceConfig"),
    ("validate_data_resource_config", "ValidateDataResourceConfig"),
    ("upgrade_resource_state", "UpgradeResourceState"),
    ("configure_provider", "ConfigureProvider"),
    ("read_resource", "ReadResource"),
    ("plan_resource_change", "PlanResourceChange"),
    ("apply_resource_change", "ApplyResourceChange"),
    ("import_resource_state", "ImportResourceState"),
    ("read_data_source", "ReadDataSource"),
    ("stop_provider", "StopProvider"),
];

fn protoc_available() -> bool {
    let protoc = std::env::var("PROTOC").unwrap_or_else(|_| "protoc".to_string());
    Command::new(protoc)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/tfplugin6.proto");
    println!("cargo:rerun-if-changed=proto/tfplugin6.pb.rs");
    println!("cargo:rerun-if-env-changed=PROTOC");
    println!("cargo:rustc-check-cfg=cfg(tfplugin6_pregenerated)");

    if protoc_available() {
        tonic_build::configure()
            .build_client(false)
            .build_server(true)
            .compile_protos(&["proto/tfplugin6.proto"], &["proto/"])?;
        return Ok(());
    }

    println!("cargo:warning=protoc not found, using pregenerated tfplugin6 messages");
    println!("cargo:rustc-cfg=tfplugin6_pregenerated");

    let service = RPCS
        .iter()
        .fold(
            Service::builder().name("Provider").package("tfplugin6"),
            |builder, (name, route)| {
                builder.method(
                    Method::builder()
                        .name(*name)
                        .route_name(*route)
                        .input_type(format!("crate::proto::{}::Request", name))
                        .output_type(format!("crate::proto::{}::Response", name))
                        .codec_path("tonic::codec::ProstCodec")
                        .build(),
                )
            },
        )
        .build();

    Builder::new().build_client(false).compile(&[service]);
    Ok(())
}
