// Models module - contains Diagram, User and pagination types

pub mod diagram;
pub mod pagination;
pub mod user;

pub use diagram::{
    CreateDiagramRequest, Diagram, DiagramFilter, DiagramPatch, NewDiagram, TechnicalDetailsView,
    UpdateDiagramRequest,
};
pub use pagination::{Page, Pagination};
pub use user::{AuthPayload, LoginRequest, NewUser, RegisterRequest, User, UserSummary};
