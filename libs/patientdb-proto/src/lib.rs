//! Wire protocol shared by every component of the patientdb distributed
//! query service: the framed IPC envelope, the calendar `Date` type, the
//! fixed-size Aggregator address record, and the query command grammar.

pub mod addr;
pub mod command;
pub mod date;
pub mod frame;

pub use addr::WireAddr;
pub use command::{parse_query, CommandKind, ParsedQuery, ProtocolError};
pub use date::{Date, DateError};
pub use frame::{read_raw, read_string, write_raw, write_string, FrameError};
