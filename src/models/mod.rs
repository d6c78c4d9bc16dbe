pub mod item;
pub mod page;
pub mod quality;
pub mod review_event;
pub mod sm2;
pub mod statistics;
pub mod status;
pub mod timestamp;

pub use item::SchedulableItem;
pub use page::{DueCursor, DuePage};
pub use quality::{Quality, ReviewRating};
pub use review_event::ReviewEvent;
pub use sm2::{SrsOutcome, SrsState};
pub use statistics::{Statistics, StatisticsAccumulator};
pub use status::ItemStatus;
