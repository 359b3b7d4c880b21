//! Protocol buffer types for Terraform Plugin Protocol v6
//!
//! Generated at build time by tonic_build from `proto/tfplugin6.proto`. When
//! protoc is missing, `build.rs` falls back to the checked-in
//! `proto/tfplugin6.pb.rs` and generates only the service trait and router.
//!
//! Several names collide with framework types (`DynamicValue`, `Diagnostic`,
//! `AttributePath`, `Schema`); always refer to these through `proto::`.

#[cfg(not(tfplugin6_pregenerated))]
tonic::include_proto!("tfplugin6");

#[cfg(tfplugin6_pregenerated)]
include!("../proto/tfplugin6.pb.rs");
#[cfg(tfplugin6_pregenerated)]
include!(concat!(env!("OUT_DIR"), "/tfplugin6.Provider.rs"));

pub use provider_server::ProviderServer;
