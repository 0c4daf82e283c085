pub mod api_handler;

pub use api_handler::ApiState;
