mod countdown;
mod patrol;
mod player;
mod room;

pub(crate) use countdown::{Countdown, CountdownTick, TRAUMA_COUNTDOWN_SECONDS};
pub(crate) use patrol::{yard_route, PatrolAgent};
pub(crate) use player::PlayerController;
pub(crate) use room::Room;
