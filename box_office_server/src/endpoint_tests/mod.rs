mod catalog;
mod door;
mod helpers;
mod mocks;
mod orders;
mod sessions;
