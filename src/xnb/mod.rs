// The XNB container.
//
// - `header`:   magic, platform, version, flags and size fields
// - `document`: Document, Value and Export, the decoded content model
// - `codec`:    unpack / pack

pub mod codec;
pub mod document;
pub mod header;

pub use codec::{UnpackOptions, pack, unpack, unpack_with};
pub use document::{Document, Export, HeaderInfo, ReaderDescriptor, Value};
pub use header::{Header, HeaderFlags, Platform};
