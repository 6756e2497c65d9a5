mod preference;
mod user_record;

pub use preference::{Preference, Texts};
pub use user_record::UserRecord;
