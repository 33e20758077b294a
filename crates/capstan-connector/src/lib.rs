//! Connectors: execution backends provided by third parties.
//!
//! A connector has the same lifecycle contract as an executor but is
//! addressed by a vendor-prefixed kind string (`aws/sagemaker`,
//! `kubeflow/pytorchjob`). Two shapes exist: [`ResourceConnector`]
//! materialises an opaque custom resource in the object store, and
//! [`ServiceConnector`] submits jobs to an out-of-cluster service. Concrete
//! connectors live outside this repository; the contracts and the
//! [`ConnectorRegistry`] are what the reconciler binds against.

mod connector;
mod error;
mod registry;

pub use connector::{ResourceConnector, ServiceConnector};
pub use error::ConnectorError;
pub use registry::ConnectorRegistry;
