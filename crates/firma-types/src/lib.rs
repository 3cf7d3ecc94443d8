pub mod fields;
pub mod profile;
pub mod session;
pub mod signature;
pub mod view;

pub use fields::{FieldId, FieldType, SignatureField, TextField};
pub use profile::{FieldDefaults, UserProfile};
pub use session::DocumentState;
pub use signature::{Signature, SignatureKind};
pub use view::{PageView, Size};
