pub mod registrations;
pub mod settings;
pub mod status;
pub mod students;
pub mod tours;
