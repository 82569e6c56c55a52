// @generated
// Generated from: api/resource/definitions/k8s/k8s.proto (subset)
// Manual check-in for offline builds.

/// NodenameSpec describes Kubernetes nodename.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NodenameSpec {
    #[prost(string, tag = "1")]
    pub nodename: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub hostname_version: ::prost::alloc::string::String,
    #[prost(bool, tag = "3")]
    pub skip_node_registration: bool,
}
