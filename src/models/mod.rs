pub mod counter;
pub mod movie;
pub mod session;
pub mod user;

pub use counter::CounterRecord;
pub use movie::MovieRecord;
pub use session::{SessionContext, SessionRecord};
pub use user::{Role, UserRecord};
