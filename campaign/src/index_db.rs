//! sqlite index of the eyeball products of a run.
//!
//! Table `files` maps each product to its exposure and chip. Table `qa`
//! holds reviewer scores keyed by user and file.

use diesel::prelude::*;
use diesel::sql_query;
use diesel::sqlite::SqliteConnection;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{CampaignError, Result};
use crate::run_config::{RunConfig, RunExposure};
use crate::run_store::{ensure_dir, RunStore};

pub mod schema {
    diesel::table! {
        files (fileid) {
            fileid -> Integer,
            run -> Text,
            expname -> Text,
            ccdname -> Text,
            ccd -> Integer,
            band -> Text,
            field -> Text,
        }
    }

    diesel::table! {
        qa (qaid) {
            qaid -> Integer,
            userid -> Integer,
            fileid -> Integer,
            score -> Integer,
            comments -> Text,
        }
    }
}

use schema::{files, qa};

pub const FILES_INDEX_FIELDS: [&str; 4] = ["ccdname", "expname", "ccd", "band"];
pub const QA_INDEX_FIELDS: [&str; 4] = ["userid", "fileid", "score", "comments"];

const CREATE_FILES: &str = "CREATE TABLE files (
    fileid INTEGER PRIMARY KEY,
    run TEXT NOT NULL,
    expname TEXT NOT NULL,
    ccdname TEXT NOT NULL,
    ccd INTEGER NOT NULL,
    band TEXT NOT NULL,
    field TEXT NOT NULL
)";

const CREATE_QA: &str = "CREATE TABLE qa (
    qaid INTEGER PRIMARY KEY,
    userid INTEGER NOT NULL,
    fileid INTEGER NOT NULL,
    score INTEGER NOT NULL,
    comments TEXT NOT NULL
)";

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = files)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FileRow {
    pub fileid: i32,
    pub run: String,
    pub expname: String,
    pub ccdname: String,
    pub ccd: i32,
    pub band: String,
    pub field: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = files)]
pub struct NewFileRow {
    pub run: String,
    pub expname: String,
    pub ccdname: String,
    pub ccd: i32,
    pub band: String,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = qa)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct QaRow {
    pub qaid: i32,
    pub userid: i32,
    pub fileid: i32,
    pub score: i32,
    pub comments: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = qa)]
pub struct NewQaRow {
    pub userid: i32,
    pub fileid: i32,
    pub score: i32,
    pub comments: String,
}

/// Outcome of [`IndexDb::populate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateSummary {
    pub inserted: usize,
    /// Expected products not found on disk
    pub missing: usize,
}

pub struct IndexDb {
    path: PathBuf,
    conn: SqliteConnection,
}

impl IndexDb {
    /// Create an empty database at `path`, replacing any existing file.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        if path.exists() {
            info!("removing existing {}", path.display());
            std::fs::remove_file(path).map_err(|e| CampaignError::io(path, e))?;
        }

        info!("opening database {}", path.display());
        let mut conn = SqliteConnection::establish(&path.to_string_lossy())?;
        sql_query(CREATE_FILES).execute(&mut conn)?;
        sql_query(CREATE_QA).execute(&mut conn)?;

        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    /// Open an existing database.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CampaignError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "database does not exist"),
            ));
        }
        let conn = SqliteConnection::establish(&path.to_string_lossy())?;
        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create `{table}_{field}_idx` on each of `fields`.
    pub fn add_indices(&mut self, table: &str, fields: &[&str]) -> Result<()> {
        for field in fields {
            let query = format!("CREATE INDEX {table}_{field}_idx ON {table} ({field})");
            debug!("{query}");
            sql_query(query).execute(&mut self.conn)?;
        }
        Ok(())
    }

    pub fn insert_files(&mut self, rows: &[NewFileRow]) -> Result<usize> {
        let inserted = self.conn.transaction(|conn| {
            let mut n = 0;
            for row in rows {
                n += diesel::insert_into(files::table).values(row).execute(conn)?;
            }
            Ok::<_, diesel::result::Error>(n)
        })?;
        Ok(inserted)
    }

    /// Insert one row per existing product of the run.
    ///
    /// Products expected from the exposure list but absent on disk are
    /// logged and counted as missing.
    pub fn populate(
        &mut self,
        store: &RunStore,
        run: &str,
        exposures: &[RunExposure],
        config: &RunConfig,
    ) -> Result<PopulateSummary> {
        let ccds = config.ccds();
        let ntot = exposures.len() * ccds.len();
        info!("populating files table, {ntot} products expected");

        let mut rows = Vec::with_capacity(ntot);
        let mut missing = 0;
        for exposure in exposures {
            for &ccd in &ccds {
                let field = store.output_file(run, &exposure.expname, ccd);
                if !field.exists() {
                    warn!("missing file: {}", field.display());
                    missing += 1;
                    continue;
                }
                rows.push(NewFileRow {
                    run: exposure.run.clone(),
                    expname: exposure.expname.clone(),
                    ccdname: format!("{}_{:02}", exposure.expname, ccd),
                    ccd: ccd as i32,
                    band: exposure.band.clone(),
                    field: field.display().to_string(),
                });
            }
        }

        let inserted = self.insert_files(&rows)?;
        info!("{missing}/{ntot} were missing");
        Ok(PopulateSummary { inserted, missing })
    }

    pub fn files(&mut self) -> Result<Vec<FileRow>> {
        Ok(files::table
            .order(files::fileid.asc())
            .select(FileRow::as_select())
            .load(&mut self.conn)?)
    }

    pub fn files_for_exposure(&mut self, expname: &str) -> Result<Vec<FileRow>> {
        Ok(files::table
            .filter(files::expname.eq(expname))
            .order(files::ccd.asc())
            .select(FileRow::as_select())
            .load(&mut self.conn)?)
    }

    pub fn add_score(&mut self, row: &NewQaRow) -> Result<()> {
        diesel::insert_into(qa::table)
            .values(row)
            .execute(&mut self.conn)?;
        Ok(())
    }

    pub fn scores_for_file(&mut self, fileid: i32) -> Result<Vec<QaRow>> {
        Ok(qa::table
            .filter(qa::fileid.eq(fileid))
            .order(qa::qaid.asc())
            .select(QaRow::as_select())
            .load(&mut self.conn)?)
    }
}
