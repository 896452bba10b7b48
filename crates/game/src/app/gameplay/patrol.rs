use escape_engine::{EntityDesc, EntityId, EntityKind, SceneWorld, Transform, Vec3};

pub(crate) const PATROL_WALK_SPEED: f32 = 2.3;
pub(crate) const PATROL_CATCH_DISTANCE: f32 = 5.5;
pub(crate) const PATROL_HEIGHT_TOLERANCE: f32 = 2.0;
pub(crate) const WAYPOINT_REACHED_DISTANCE: f32 = 0.5;

pub(crate) fn yard_route() -> Vec<Vec3> {
    vec![
        Vec3::new(-10.0, 0.1, -8.0),
        Vec3::new(4.0, 0.1, -8.0),
        Vec3::new(4.0, 0.1, 14.0),
        Vec3::new(-10.0, 0.1, 14.0),
    ]
}

/// Guard walking a closed waypoint loop.
#[derive(Debug, Clone)]
pub(crate) struct PatrolAgent {
    entity: Option<EntityId>,
    route: Vec<Vec3>,
    next_waypoint: usize,
    position: Vec3,
}

impl PatrolAgent {
    pub(crate) fn new(route: Vec<Vec3>) -> Self {
        let position = route.first().copied().unwrap_or(Vec3::ZERO);
        Self {
            entity: None,
            next_waypoint: usize::from(route.len() > 1),
            route,
            position,
        }
    }

    pub(crate) fn spawn(&mut self, world: &mut SceneWorld) -> EntityId {
        let id = world.spawn(
            EntityDesc::new("guard", EntityKind::Agent),
            Transform::at(self.position),
        );
        self.entity = Some(id);
        id
    }

    pub(crate) fn position(&self) -> Vec3 {
        self.position
    }

    pub(crate) fn next_waypoint(&self) -> usize {
        self.next_waypoint
    }

    pub(crate) fn reset(&mut self, world: &mut SceneWorld) {
        self.position = self.route.first().copied().unwrap_or(Vec3::ZERO);
        self.next_waypoint = usize::from(self.route.len() > 1);
        self.sync(world);
    }

    pub(crate) fn update(&mut self, dt_seconds: f32, world: &mut SceneWorld) {
        let Some(target) = self.route.get(self.next_waypoint).copied() else {
            return;
        };
        let offset = target - self.position;
        let distance = offset.horizontal_length();
        if distance <= WAYPOINT_REACHED_DISTANCE {
            self.next_waypoint = (self.next_waypoint + 1) % self.route.len();
            return;
        }

        let travel = (PATROL_WALK_SPEED * dt_seconds.max(0.0)).min(distance);
        let step = Vec3::new(offset.x / distance * travel, 0.0, offset.z / distance * travel);
        self.position = self.position + step;
        if let Some(id) = self.entity {
            world.set_yaw(id, offset.x.atan2(offset.z).to_degrees());
        }
        self.sync(world);
    }

    /// Same floor and within reach horizontally.
    pub(crate) fn catches(&self, player: Vec3) -> bool {
        (player.y - self.position.y).abs() < PATROL_HEIGHT_TOLERANCE
            && self.position.horizontal_distance(player) <= PATROL_CATCH_DISTANCE
    }

    fn sync(&self, world: &mut SceneWorld) {
        if let Some(id) = self.entity {
            world.set_position(id, self.position);
        }
    }
}
