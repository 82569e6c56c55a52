// @generated
// Generated from: cosi-project/specification proto/v1alpha1/{resource,state}.proto (subset: Get)
// Manual check-in for offline builds.

/// Metadata represents resource metadata.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Metadata {
    #[prost(string, tag = "1")]
    pub namespace: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub r#type: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub id: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub version: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub owner: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub phase: ::prost::alloc::string::String,
}

/// Spec defines content of the resource.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Spec {
    /// Protobuf-serialized representation of the resource.
    #[prost(bytes = "vec", tag = "1")]
    pub proto_spec: ::prost::alloc::vec::Vec<u8>,
    /// YAML representation of the spec (optional).
    #[prost(string, tag = "2")]
    pub yaml_spec: ::prost::alloc::string::String,
}

/// Resource is a translation of resource.Resource as gRPC message.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Resource {
    #[prost(message, optional, tag = "1")]
    pub metadata: ::core::option::Option<Metadata>,
    #[prost(message, optional, tag = "2")]
    pub spec: ::core::option::Option<Spec>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetOptions {
    #[prost(string, tag = "1")]
    pub resource_version: ::prost::alloc::string::String,
}

/// Get RPC
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRequest {
    #[prost(string, tag = "1")]
    pub namespace: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub r#type: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub id: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "4")]
    pub options: ::core::option::Option<GetOptions>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetResponse {
    #[prost(message, optional, tag = "1")]
    pub resource: ::core::option::Option<Resource>,
}

/// Generated client implementations.
pub mod state_client {
    #![allow(
        unused_variables,
        dead_code,
        missing_docs,
        clippy::wildcard_imports,
        clippy::let_unit_value,
    )]
    use tonic::codegen::*;
    use tonic::codegen::http::Uri;

    /// State is a resource state service.
    #[derive(Debug, Clone)]
    pub struct StateClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl StateClient<tonic::transport::Channel> {
        /// Attempt to create a new client by connecting to a given endpoint.
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> StateClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        pub fn with_origin(inner: T, origin: Uri) -> Self {
            let inner = tonic::client::Grpc::with_origin(inner, origin);
            Self { inner }
        }

        pub async fn get(
            &mut self,
            request: impl tonic::IntoRequest<super::GetRequest>,
        ) -> std::result::Result<tonic::Response<super::GetResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
                })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cosi.resource.State/Get");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("cosi.resource.State", "Get"));
            self.inner.unary(req, path, codec).await
        }
    }
}
