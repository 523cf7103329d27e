mod objects;

pub use objects::{handle_object, object_key, requested_backend, LOCAL_FLAG};
