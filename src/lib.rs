pub mod artwork;
pub mod asc;
pub mod cli;
pub mod commands;
pub mod gamecenter;
pub mod logging;
pub mod token;
pub mod upload;
pub mod util;

pub use asc::{ApiError, AppStoreConnectClient, Config, Listing};
pub use gamecenter::{Catalog, ItemKind};
pub use token::{AuthError, TokenIssuer};
pub use util::{resource_id, resource_name, vendor_identifier};
