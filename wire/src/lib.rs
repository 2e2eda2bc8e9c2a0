//! The wire record carrying a state update (§3 `Instruction`), the
//! fragments it is split into for transmission (§4.3), and the logic that
//! reassembles them on the other end.

mod assembly;
mod compression;
mod datagram;
mod error;
mod fragment;
mod fragmenter;
mod instruction;

pub use assembly::FragmentAssembly;
pub use compression::CompressionMarker;
pub use datagram::DatagramHeader;
pub use error::{DecodeError, MalformedFragment};
pub use fragment::{Fragment, FRAGMENT_HEADER_LEN};
pub use fragmenter::{Fragmenter, HEADER_LEN};
pub use instruction::Instruction;
