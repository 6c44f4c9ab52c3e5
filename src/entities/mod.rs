//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod category;
pub mod feedback;
pub mod guild;
pub mod note;
pub mod panel;
pub mod staff_profile;
pub mod ticket;

// Re-export specific types to avoid conflicts
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use feedback::{Column as FeedbackColumn, Entity as Feedback, Model as FeedbackModel};
pub use guild::{Column as GuildColumn, Entity as Guild, Model as GuildModel};
pub use note::{Column as NoteColumn, Entity as Note, Model as NoteModel};
pub use panel::{Column as PanelColumn, Entity as Panel, Model as PanelModel};
pub use staff_profile::{
    Column as StaffProfileColumn, Entity as StaffProfile, Model as StaffProfileModel,
};
pub use ticket::{Column as TicketColumn, Entity as Ticket, Model as TicketModel};
