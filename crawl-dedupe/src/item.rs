//! File layout of a crawl item's working directory.
//!
//! Each item is crawled in its own directory under the data directory, named for a hash of the
//! item name so arbitrary names map to safe paths. The capture stage writes `<stem>.warc.gz` and
//! `<stem>_data.txt` there, and deduplication writes `<stem>-deduplicated.warc.gz` beside them.

use std::fmt::Display;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use data_encoding::HEXLOWER;
use sha1::{Digest, Sha1};

/// Paths belonging to one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPaths {
    /// Directory holding the item's files while it is processed.
    pub item_dir: PathBuf,
    /// Stem shared by the item's file names.
    pub warc_file_base: String,
}

/// Hex-encoded SHA-1 of an item name.
pub fn item_hash(item_name: &str) -> String {
    HEXLOWER.encode(&Sha1::digest(item_name.as_bytes()))
}

impl ItemPaths {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(item_dir: P, warc_file_base: S) -> Self {
        ItemPaths {
            item_dir: item_dir.into(),
            warc_file_base: warc_file_base.into(),
        }
    }

    /// Choose the paths for an item started at `now`.
    ///
    /// The directory is `<data_dir>/<hash>` and the stem is `<warc_prefix>-<hash>-<timestamp>`,
    /// where the hash is [`item_hash`] of the item name and the timestamp is formatted
    /// `YYYYmmdd-HHMMSS`.
    ///
    /// ```
    /// # use crawl_dedupe::item::ItemPaths;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let started = Utc.with_ymd_and_hms(2019, 6, 22, 10, 0, 0).unwrap();
    /// let paths = ItemPaths::for_item("/data", "example", "item:1", started);
    /// assert!(paths.warc_file_base.starts_with("example-"));
    /// assert!(paths.warc_file_base.ends_with("-20190622-100000"));
    /// ```
    pub fn for_item<P, Tz>(
        data_dir: P,
        warc_prefix: &str,
        item_name: &str,
        now: DateTime<Tz>,
    ) -> Self
    where
        P: AsRef<Path>,
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let hash = item_hash(item_name);
        let base = format!("{}-{}-{}", warc_prefix, hash, now.format("%Y%m%d-%H%M%S"));
        ItemPaths::new(data_dir.as_ref().join(&hash), base)
    }

    fn file(&self, suffix: &str) -> PathBuf {
        self.item_dir.join(format!("{}{}", self.warc_file_base, suffix))
    }

    /// The WARC written by the capture stage.
    pub fn raw_warc(&self) -> PathBuf {
        self.file(".warc.gz")
    }

    /// The output of deduplication.
    pub fn deduplicated_warc(&self) -> PathBuf {
        self.file("-deduplicated.warc.gz")
    }

    /// The capture metadata sidecar.
    pub fn data_file(&self) -> PathBuf {
        self.file("_data.txt")
    }

    /// The WARC to be moved into permanent storage: the deduplicated one if deduplication is
    /// enabled, otherwise the raw capture.
    pub fn finalized_warc(&self, dedupe_enabled: bool) -> PathBuf {
        if dedupe_enabled {
            self.deduplicated_warc()
        } else {
            self.raw_warc()
        }
    }

    /// Create an empty item directory, containing empty raw WARC and data files.
    ///
    /// Anything left in the directory from an earlier attempt at the same item is removed.
    pub fn prepare(&self) -> io::Result<()> {
        if self.item_dir.is_dir() {
            debug!("Removing stale item directory {:?}", self.item_dir);
            fs::remove_dir_all(&self.item_dir)?;
        }
        fs::create_dir_all(&self.item_dir)?;

        File::create(self.raw_warc())?;
        File::create(self.data_file())?;
        Ok(())
    }
}
