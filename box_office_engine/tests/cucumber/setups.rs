use cucumber::given;

use crate::cucumber::{box_office_world::BoxOfficeSystem, BoxOfficeWorld};

#[given("a fresh box office")]
async fn fresh_box_office(world: &mut BoxOfficeWorld) {
    let system = BoxOfficeSystem::new().await;
    world.system = Some(system);
}
