#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

/// Build the server from `Rocket.toml` and `ROCKET_*` environment variables.
pub fn build() -> Rocket<Build> {
    assemble(rocket::build())
}

/// Attach everything the API needs to a rocket. Config, roster and store are
/// loaded from the rocket's figment when it ignites.
fn assemble(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .attach(logging::LoggerFairing)
        .attach(config::ConfigFairing)
        .attach(config::RosterFairing)
        .attach(config::StoreFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
}

/// A rocket over a fresh in-memory store, the example roster and test secrets.
#[cfg(test)]
pub(crate) fn test_rocket() -> Rocket<Build> {
    use model::roster::Roster;

    let figment = rocket::Config::figment()
        .merge(("log_level", "off"))
        .merge(("auth_ttl", 3600))
        .merge(("jwt_secret", "test-jwt-secret"))
        .merge(("admin_password", "zetakappa"))
        .merge(("max_nominations_per_position", 5))
        .merge(("max_submitter_name_length", 60))
        .merge(("store", "memory"))
        .merge(("roster", Roster::example()));
    assemble(rocket::custom(figment))
}
