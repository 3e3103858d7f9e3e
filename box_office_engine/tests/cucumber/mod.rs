mod box_office_world;
mod setups;
mod steps;

pub use box_office_world::BoxOfficeWorld;
