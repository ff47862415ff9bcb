mod error;
pub mod metadata;
pub mod order;
pub mod path;
#[cfg(feature = "filesystem")]
pub mod storage;

#[cfg(feature = "filesystem")]
pub use zarrs;

pub use error::{Error, Result};
pub use metadata::{Axis, AxisType, Multiscales, NgffVersion, Scale};
pub use order::{DiskOrder, MemoryOrder};
pub use path::{PathResolver, ZarrPathInfo};
