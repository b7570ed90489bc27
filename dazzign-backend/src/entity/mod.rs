pub mod node;

pub use node::Entity as Node;
