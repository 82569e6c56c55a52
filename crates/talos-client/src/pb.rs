//! Protobuf messages and gRPC clients for the Talos machine API
//!
//! Only the messages and RPCs the updater needs are checked in; unknown
//! fields on the wire are skipped by prost.

#![allow(missing_docs, clippy::all, clippy::pedantic)]

pub mod common {
    include!("generated/common.rs");
}

pub mod machine {
    include!("generated/machine.rs");
}

pub mod cosi {
    pub mod resource {
        include!("generated/cosi.resource.rs");
    }
}

pub mod definitions {
    pub mod k8s {
        include!("generated/talos.resource.definitions.k8s.rs");
    }
}
