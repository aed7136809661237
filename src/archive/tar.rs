//! TAR backend, plain or with a gzip/bzip2/xz compression layer

use std::io::Read;

use super::{normalize_member_path, ArchiveCodec, ByteSource, Member};
use crate::errors::{BrowseError, BrowseResult};

#[derive(Debug, Clone, Copy)]
pub enum Compression {
    Gzip,
    Bzip2,
    Xz,
}

pub struct TarCodec {
    source: ByteSource,
    compression: Option<Compression>,
    label: String,
}

impl TarCodec {
    pub fn new(source: ByteSource, compression: Option<Compression>, label: &str) -> Self {
        Self {
            source,
            compression,
            label: label.to_string(),
        }
    }

    fn reader(&self) -> BrowseResult<tar::Archive<Box<dyn Read + '_>>> {
        let raw = self
            .source
            .open()
            .map_err(|e| BrowseError::from_io(e, &self.label))?;

        let decoded: Box<dyn Read + '_> = match self.compression {
            None => Box::new(raw),
            Some(Compression::Gzip) => Box::new(flate2::read::GzDecoder::new(raw)),
            Some(Compression::Bzip2) => Box::new(bzip2::read::BzDecoder::new(raw)),
            Some(Compression::Xz) => Box::new(xz2::read::XzDecoder::new(raw)),
        };

        Ok(tar::Archive::new(decoded))
    }

    fn unreadable(&self, what: &str, err: impl std::fmt::Display) -> BrowseError {
        BrowseError::UnreadableArchive(self.label.clone(), format!("{what}: {err}"))
    }
}

impl ArchiveCodec for TarCodec {
    fn read_index(&mut self) -> BrowseResult<Vec<Member>> {
        let mut archive = self.reader()?;
        let mut members = Vec::new();

        for entry in archive
            .entries()
            .map_err(|e| self.unreadable("bad tar stream", e))?
        {
            let entry = entry.map_err(|e| self.unreadable("bad tar entry", e))?;
            let path = entry
                .path()
                .map_err(|e| self.unreadable("bad path in tar", e))?
                .to_string_lossy()
                .into_owned();

            members.push(Member {
                path: normalize_member_path(&path),
                size: entry.header().size().unwrap_or(0),
                is_dir: entry.header().entry_type().is_dir(),
            });
        }

        Ok(members)
    }

    fn extract(&mut self, member: &str) -> BrowseResult<Vec<u8>> {
        let mut archive = self.reader()?;
        let target = normalize_member_path(member);

        for entry in archive
            .entries()
            .map_err(|e| self.unreadable("bad tar stream", e))?
        {
            let mut entry = entry.map_err(|e| self.unreadable("bad tar entry", e))?;
            let path = entry
                .path()
                .map_err(|e| self.unreadable("bad path in tar", e))?
                .to_string_lossy()
                .into_owned();

            if normalize_member_path(&path) == target {
                let mut contents = Vec::new();
                entry
                    .read_to_end(&mut contents)
                    .map_err(|e| self.unreadable("read failed", e))?;
                return Ok(contents);
            }
        }

        Err(BrowseError::MemberNotFound {
            archive: self.label.clone(),
            member: member.to_string(),
        })
    }
}
