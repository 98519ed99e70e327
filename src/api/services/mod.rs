//! Services module - business logic between the HTTP routes and storage.

pub mod diagram_service;
pub mod jwt_service;
pub mod password_service;

// Re-export for convenience
pub use diagram_service::{DiagramService, ServiceError};
pub use jwt_service::{Claims, JwtService, SharedJwtService, TokenPair, TokenType};
