//! CIM domain model
//!
//! Everything here is plain data: built by the object builder during a parse
//! or by the caller before serialization.

pub mod datetime;
pub mod feature;
pub mod message;
pub mod object;
pub mod path;
pub mod qualifier;
pub mod status;
pub mod types;
pub mod value;

pub use datetime::CimDateTime;
pub use feature::{Method, Parameter, Property};
pub use message::{
    CallTarget, CimData, Envelope, MessageBody, MethodCall, MethodKind, MethodResponse, ParamValue,
    Reply,
};
pub use object::{CimClass, CimInstance, CimObject};
pub use path::{KeyBinding, ObjectPath};
pub use qualifier::{Flavor, Qualifier, QualifierType, Scope};
pub use status::{CimError, CimStatus};
pub use types::{DataType, TypeTag};
pub use value::{Scalar, Value, ValueData};
