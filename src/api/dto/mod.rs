//! Request and response DTOs for the REST API.

pub mod message_dto;
pub mod session_dto;

pub use message_dto::{SendMessageRequest, SendMessageResponse};
pub use session_dto::{SessionActionResponse, SessionListResponse, SessionResponse};
