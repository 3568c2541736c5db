pub mod edge;
pub mod request_id;
