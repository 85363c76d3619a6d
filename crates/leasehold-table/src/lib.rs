//! Open-addressing hash table keyed by runtime addresses.
//!
//! [`AddressTable`] maps a key to an owned value using linear probing with
//! no tombstones: deletion compacts the probe run behind the removed slot
//! instead. Growth doubles the slot array and is all-or-nothing.
//!
//! ```text
//! slot:   0     1     2     3     4     5     6     7
//!       [ - ] [ A ] [ B ] [ C ] [ - ] [ D ] [ - ] [ - ]
//!               └──── one run ────┘
//! A, B, C share home slot 1. Removing B re-places C at slot 2;
//! lookups for C stop at the first empty slot, so the run must stay dense.
//! ```
//!
//! Keys describe their own probe sequence through [`TableKey`]. Address,
//! integer, and string keys are provided.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod key;
pub mod table;

pub use config::TableConfig;
pub use key::{TableKey, KNUTH_MULTIPLIER};
pub use table::{AddressTable, Rejected};
