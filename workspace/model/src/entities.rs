//! This file serves as the root for all SeaORM entity modules.
//! Roles and users back the admin dashboard; students are the learners
//! that register through the public signup form.

pub mod role;
pub mod student;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::role::Entity as Role;
    pub use super::student::Entity as Student;
    pub use super::user::Entity as User;
}
