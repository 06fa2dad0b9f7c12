pub mod residency_table;

pub use residency_table::{EntryId, ResidencyTable};
