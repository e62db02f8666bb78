//! Property listings managed by agents

pub mod model;
pub mod repository;

pub use model::{
    ListingType, NewProperty, Property, PropertyChanges, PropertyFilter, PropertyStatus,
    PropertyType,
};
pub use repository::PropertyRepository;
