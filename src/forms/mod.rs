pub mod control;
pub mod encoding;
pub mod form;

pub use control::{ControlKind, FileUpload, FormControl, SelectOption};
pub use encoding::{FormEntry, MultipartBody};
pub use form::{ButtonHandle, Enctype, FieldValue, Form};
