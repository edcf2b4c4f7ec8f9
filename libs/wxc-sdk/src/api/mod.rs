//! Endpoint groups.

pub mod devices;
pub mod licenses;
pub mod locations;
pub mod people;

pub use devices::DevicesApi;
pub use licenses::LicensesApi;
pub use locations::LocationsApi;
pub use people::PeopleApi;
