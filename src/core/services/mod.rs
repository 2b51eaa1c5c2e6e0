pub mod list_service;
pub mod resources;
pub mod traits;

pub use list_service::RestListService;
pub use resources::Resource;
pub use traits::ListService;
