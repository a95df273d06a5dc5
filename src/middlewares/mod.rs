pub mod cors;
pub mod json_content_type;

pub use cors::create_cors;
pub use json_content_type::JsonContentType;
