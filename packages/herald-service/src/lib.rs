pub mod audience;

mod error;

pub use audience::AudiencePage;
pub use error::{Error, Result};

use herald_config::Config;
use herald_storage::db::Db;

pub struct HeraldService {
	pub cfg: Config,
	pub db: Db,
}
impl HeraldService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db }
	}
}
