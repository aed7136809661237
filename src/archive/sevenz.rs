//! 7z backend

use std::io::Read;

use super::{normalize_member_path, ArchiveCodec, ByteSource, Member, ReadSeek};
use crate::errors::{BrowseError, BrowseResult};

pub struct SevenZipCodec {
    source: ByteSource,
    password: Option<String>,
    label: String,
}

impl SevenZipCodec {
    pub fn new(source: ByteSource, password: Option<&str>, label: &str) -> Self {
        Self {
            source,
            password: password.map(|p| p.to_string()),
            label: label.to_string(),
        }
    }

    fn reader(&self) -> BrowseResult<sevenz_rust::SevenZReader<Box<dyn ReadSeek + '_>>> {
        let password = match &self.password {
            Some(p) => sevenz_rust::Password::from(p.as_str()),
            None => sevenz_rust::Password::empty(),
        };
        let len = self
            .source
            .len()
            .map_err(|e| BrowseError::from_io(e, &self.label))?;
        let raw = self
            .source
            .open()
            .map_err(|e| BrowseError::from_io(e, &self.label))?;
        sevenz_rust::SevenZReader::new(raw, len, password).map_err(|e| self.classify(e))
    }

    fn classify(&self, err: sevenz_rust::Error) -> BrowseError {
        let msg = format!("{err}");
        let lower = msg.to_lowercase();
        if lower.contains("password") || lower.contains("decrypt") {
            BrowseError::PasswordRequired {
                archive: self.label.clone(),
            }
        } else if lower.contains("unsupported") {
            BrowseError::UnsupportedFormat(self.label.clone(), msg)
        } else {
            BrowseError::UnreadableArchive(self.label.clone(), msg)
        }
    }
}

impl ArchiveCodec for SevenZipCodec {
    fn read_index(&mut self) -> BrowseResult<Vec<Member>> {
        let reader = self.reader()?;

        let members = reader
            .archive()
            .files
            .iter()
            .map(|entry| Member {
                path: normalize_member_path(entry.name()),
                size: entry.size(),
                is_dir: entry.is_directory(),
            })
            .collect();

        Ok(members)
    }

    fn extract(&mut self, member: &str) -> BrowseResult<Vec<u8>> {
        let mut reader = self.reader()?;
        let target = normalize_member_path(member);
        let mut found: Option<Vec<u8>> = None;

        // Solid blocks force a sequential walk; every entry up to the
        // target has to be decoded anyway.
        reader
            .for_each_entries(|entry, rd| {
                let entry_path = normalize_member_path(entry.name());
                let mut data = Vec::new();
                rd.read_to_end(&mut data)
                    .map_err(|e| sevenz_rust::Error::other(format!("read failed: {e}")))?;
                if entry_path == target {
                    found = Some(data);
                    return Ok(false);
                }
                Ok(true)
            })
            .map_err(|e| self.classify(e))?;

        found.ok_or_else(|| BrowseError::MemberNotFound {
            archive: self.label.clone(),
            member: member.to_string(),
        })
    }
}
