//! Reader for the Metaflask member and project registry.
//!
//! A registry checkout holds a `members/` directory of `NNNN_<id>.txt`
//! header-block files and a `projects/` directory with one subdirectory per
//! project. [`MetaView`] reads the members eagerly, discovers the projects,
//! and exposes lookups, the sponsorship tree and a JSON rendering.
//!
//! ```no_run
//! use metaflask_registry::MetaView;
//!
//! let view = MetaView::open("checkout")?;
//! for member in view.iter_members() {
//!     println!("{member}");
//! }
//! # Ok::<(), metaflask_registry::RegistryError>(())
//! ```

pub mod cache;
pub mod error;
pub mod header;
pub mod index;
pub mod package;
pub mod person;
pub mod project;
pub mod reader;
pub mod registry;
pub mod serialize;
pub mod tree;

mod resolver;

pub use cache::{CacheMode, ContentCache};
pub use error::{RegistryError, RegistryResult};
pub use header::{content_checksum, HeaderBlock};
pub use index::MemberIndex;
pub use package::{compare_versions, Download, DownloadStats, PackageSnapshot, Release};
pub use person::{Member, Person, SELF_SPONSOR};
pub use project::{ExtensionStatus, Project, ProjectLead, PACKAGE_CACHE_GROUP};
pub use registry::MetaView;
pub use tree::SponsorTree;
