// @generated
// Generated from: api/common/common.proto (subset)
// Manual check-in for offline builds.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Metadata {
    /// hostname of the server response comes from (injected by proxy)
    #[prost(string, tag = "1")]
    pub hostname: ::prost::alloc::string::String,
    /// error is set if request failed to the upstream (rest of response is undefined)
    #[prost(string, tag = "2")]
    pub error: ::prost::alloc::string::String,
}
