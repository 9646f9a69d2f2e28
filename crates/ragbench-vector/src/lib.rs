//! ragbench-vector
//!
//! LanceDB-backed dense store. The store keeps only the database location;
//! every operation opens a connection and table, uses them and drops them
//! before returning, on success and error paths alike.

use anyhow::Result;
use lancedb::{connect, Connection, Table};
use std::path::{Path, PathBuf};

pub mod schema;
pub mod search;
pub mod writer;

pub struct VectorStore {
	runtime: tokio::runtime::Runtime,
	db_path: PathBuf,
	table_name: String,
	dim: usize,
}

impl VectorStore {
	/// Open an existing store. The table is not touched until the first query.
	pub fn open(db_path: &Path, table_name: &str, dim: usize) -> Result<Self> {
		let dim_i32 = i32::try_from(dim).map_err(|_| anyhow::anyhow!("embedding dimension {} is too large", dim))?;
		if dim_i32 == 0 { anyhow::bail!("embedding dimension must be at least 1"); }
		Ok(Self { runtime: tokio::runtime::Runtime::new()?, db_path: db_path.to_path_buf(), table_name: table_name.to_string(), dim })
	}

	/// Open a store at `db_path`, wiping any previous database there.
	pub fn create(db_path: &Path, table_name: &str, dim: usize) -> Result<Self> {
		if db_path.exists() { std::fs::remove_dir_all(db_path)?; }
		std::fs::create_dir_all(db_path)?;
		Self::open(db_path, table_name, dim)
	}

	pub fn dim(&self) -> usize { self.dim }

	pub fn table_name(&self) -> &str { &self.table_name }

	pub fn count_rows(&self) -> Result<usize> {
		self.runtime.block_on(async {
			let (_db, table) = self.open_table().await?;
			Ok(table.count_rows(None).await?)
		})
	}

	pub(crate) async fn connect(&self) -> Result<Connection> {
		Ok(connect(self.db_path.to_string_lossy().as_ref()).execute().await?)
	}

	pub(crate) async fn open_table(&self) -> Result<(Connection, Table)> {
		let db = self.connect().await?;
		let table = db
			.open_table(&self.table_name)
			.execute()
			.await
			.map_err(|e| anyhow::anyhow!("failed to open table '{}' at {}: {}", self.table_name, self.db_path.display(), e))?;
		Ok((db, table))
	}
}
