mod envelope;
mod error;
mod object_message;

pub use envelope::{Envelope, Scope, PROTOCOL_VERSION};
pub use error::WireError;
pub use object_message::{
    ObjectMessage, OBJECT_ACK_KIND, OBJECT_PATCH_KIND, OBJECT_REPLACE_KIND, OBJECT_REQUEST_KIND,
};
