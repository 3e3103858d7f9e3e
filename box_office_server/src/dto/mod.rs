mod catalog;

pub use catalog::{NewProduct, NewProductEvent};
