mod dispatch;
mod door;
mod effects;
mod exit;
mod keypad;
mod prop;
mod proximity;
mod state;
mod tasks;

pub use dispatch::InteractionDispatcher;
pub use door::{
    BreakableWall, Door, DoorState, Hinge, SlidingDoor, DOOR_COLLISION_RESTORE_SECONDS,
    DOOR_OPEN_DEGREES, DOOR_SWING_SECONDS, SLIDING_DOOR_DISTANCE, SLIDING_DOOR_SECONDS,
};
pub use effects::{
    DeliveryTarget, ExitDoor, FlavorProp, HandwashStation, ItemPickup, KeySource, MovableProp,
    SupplySource, TreatmentStation,
};
pub use exit::{
    ExitAttempt, ExitBeat, ExitSequence, EXIT_DOOR_BANNER_SECONDS, EXIT_FADE_SECONDS,
    EXIT_LEVEL_BANNER_SECONDS,
};
pub use keypad::{CodeLock, KeypadOutcome};
pub use prop::{
    InteractCategory, Interactable, InteractionContext, InteractionEvent, InteractionOutcome,
    PropEffect, PropHandle, PropSet, DEFAULT_PRIORITY,
};
pub use proximity::{ProximityResolver, ProximityTarget};
pub use state::GameState;
pub use tasks::{Task, TaskGraph, TaskGraphError, UnresolvedPrerequisite};
