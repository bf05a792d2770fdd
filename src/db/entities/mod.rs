//! Database entities

pub mod access_token;
pub mod block;
pub mod block_template;
pub mod page;
pub mod project;
pub mod user;
pub mod zero_base_element;
pub mod zero_block;
pub mod zero_block_responsive;
pub mod zero_layer;
pub mod zero_layer_responsive;

pub use access_token::Entity as AccessToken;
pub use block::Entity as Block;
pub use block_template::Entity as BlockTemplate;
pub use page::Entity as Page;
pub use project::Entity as Project;
pub use user::Entity as User;
pub use zero_base_element::Entity as ZeroBaseElement;
pub use zero_block::Entity as ZeroBlock;
pub use zero_block_responsive::Entity as ZeroBlockResponsive;
pub use zero_layer::Entity as ZeroLayer;
pub use zero_layer_responsive::Entity as ZeroLayerResponsive;
