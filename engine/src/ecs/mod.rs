pub mod component;
pub mod dispatch;
pub mod entity;
pub mod scene;

pub use component::Component;
pub use dispatch::{Dispatcher, Group};
pub use entity::Entity;
pub use scene::Scene;
