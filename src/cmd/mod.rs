//! CLI command implementations.
//!
//! Each submodule owns one `Commands` variant:
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `serve`  | `Serve`          |
//! | `sites`  | `Sites`          |
//! | `config` | `Config`         |

pub mod config;
pub mod serve;
pub mod sites;

pub use config::cmd_config;
pub use serve::cmd_serve;
pub use sites::cmd_sites;
